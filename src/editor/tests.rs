//! Session-level tests: gesture tokens in, graph mutations out.

use std::collections::BTreeSet;

use crate::codec::GraphData;
use crate::draw::Headless;
use crate::editor::GraphEditor;
use crate::geom::Vec2;
use crate::graph::NodeId;
use crate::logic::EditorState;

fn point_at(editor: &mut GraphEditor, x: f32, y: f32) {
    editor.update_mouse_position(Vec2::new(x, y), &Headless);
}

/// Two dots with their auto-labels: ids 1/2 (dot a) and 3/4 (dot b).
fn two_dots(editor: &mut GraphEditor) -> (NodeId, NodeId) {
    let a = editor.add_dot(Vec2::ZERO);
    let b = editor.add_dot(Vec2::new(100.0, 0.0));
    (a, b)
}

#[test]
fn double_click_on_empty_space_creates_a_labelled_dot() {
    let mut editor = GraphEditor::new();
    point_at(&mut editor, 50.0, 60.0);
    editor.trigger("dblclick empty");

    assert_eq!(editor.graph.len(), 2);
    let dot = editor.graph.nodes().find(|n| n.is_dot()).unwrap();
    assert_eq!(dot.origin, Vec2::new(50.0, 60.0));
    let label = editor.graph.nodes().find(|n| n.is_label()).unwrap();
    assert_eq!(label.source, Some(dot.id()));
}

#[test]
fn connect_gesture_links_two_dots() {
    let mut editor = GraphEditor::new();
    let (a, b) = two_dots(&mut editor);

    point_at(&mut editor, 0.0, 0.0);
    editor.trigger("mousedown left node");
    assert!(editor.is_connecting());
    assert_eq!(editor.connecting_start(), Some(a));

    point_at(&mut editor, 100.0, 0.0);
    editor.trigger("mouseup left node");

    let link = editor.graph.nodes().find(|n| n.is_link()).unwrap();
    assert_eq!(link.source, Some(a));
    assert_eq!(link.target, Some(b));
    assert_eq!(editor.state(), EditorState::NodeMode);
    assert_eq!(editor.connecting_start(), None);
}

#[test]
fn releasing_a_connect_over_a_label_creates_nothing() {
    let mut editor = GraphEditor::new();
    two_dots(&mut editor);
    let before = editor.graph.len();

    point_at(&mut editor, 0.0, 0.0);
    editor.trigger("mousedown left node");

    // (15,15) hits dot a's label, which cannot be connected to
    point_at(&mut editor, 15.0, 15.0);
    editor.trigger("mouseup left node");

    assert_eq!(editor.graph.len(), before);
    assert_eq!(editor.state(), EditorState::NodeMode);
    assert_eq!(editor.connecting_start(), None);
}

#[test]
fn releasing_a_connect_over_the_start_creates_nothing() {
    let mut editor = GraphEditor::new();
    two_dots(&mut editor);
    let before = editor.graph.len();

    point_at(&mut editor, 0.0, 0.0);
    editor.trigger("mousedown left node");
    editor.trigger("mouseup left node");

    assert_eq!(editor.graph.len(), before);
    assert_eq!(editor.state(), EditorState::NodeMode);
}

#[test]
fn pressing_on_nothing_abandons_the_connect_immediately() {
    let mut editor = GraphEditor::new();
    point_at(&mut editor, 200.0, 200.0);
    editor.trigger("mousedown left node");

    // no connectable target under the pointer, the gesture unwinds itself
    assert_eq!(editor.state(), EditorState::NodeMode);
    assert_eq!(editor.connecting_start(), None);
}

#[test]
fn rect_select_captures_what_the_rectangle_covers() {
    let mut editor = GraphEditor::new();
    let (a, b) = two_dots(&mut editor);

    point_at(&mut editor, -30.0, -30.0);
    editor.trigger("mousedown left empty");
    assert!(editor.is_rect_selecting());

    point_at(&mut editor, 40.0, 40.0);
    editor.trigger("mouseup left empty");

    // dot a and its label are inside, dot b is far outside
    assert!(editor.selected().contains(&a));
    assert!(editor.selected().contains(&(a + 1)));
    assert!(!editor.selected().contains(&b));
    assert_eq!(editor.state(), EditorState::NodeMode);
}

#[test]
fn rect_select_drawn_backwards_still_captures() {
    let mut editor = GraphEditor::new();
    let (a, _) = two_dots(&mut editor);

    point_at(&mut editor, 40.0, 40.0);
    editor.trigger("mousedown left empty");
    point_at(&mut editor, -30.0, -30.0);
    editor.trigger("mouseup left empty");

    assert!(editor.selected().contains(&a));
}

#[test]
fn dragging_a_selection_applies_the_delta_once_per_entity() {
    let mut editor = GraphEditor::new();
    let (a, b) = two_dots(&mut editor);
    let l = editor.add_link(a, b, false);

    editor.select([a, b, l]);
    point_at(&mut editor, 50.0, 0.0);
    editor.trigger("mousedown right node");
    assert!(editor.is_moving());

    point_at(&mut editor, 60.0, 5.0);

    // the link was dragged directly, so it must not also follow its
    // endpoints
    assert_eq!(editor.graph.node(a).unwrap().origin, Vec2::new(10.0, 5.0));
    assert_eq!(editor.graph.node(b).unwrap().origin, Vec2::new(110.0, 5.0));
    assert_eq!(editor.graph.node(l).unwrap().origin, Vec2::new(60.0, 5.0));

    editor.trigger("mouseup right node");
    assert!(!editor.is_moving());
}

#[test]
fn dragging_one_endpoint_moves_the_link_halfway() {
    let mut editor = GraphEditor::new();
    let (a, b) = two_dots(&mut editor);
    let l = editor.add_link(a, b, false);

    editor.select([a]);
    point_at(&mut editor, 0.0, 0.0);
    editor.trigger("mousedown right node");
    point_at(&mut editor, 10.0, 20.0);

    assert_eq!(editor.graph.node(a).unwrap().origin, Vec2::new(10.0, 20.0));
    assert_eq!(editor.graph.node(b).unwrap().origin, Vec2::new(100.0, 0.0));
    assert_eq!(editor.graph.node(l).unwrap().origin, Vec2::new(55.0, 10.0));
}

#[test]
fn selected_label_rides_with_its_selected_source() {
    let mut editor = GraphEditor::new();
    let (a, _) = two_dots(&mut editor);
    let label = a + 1;

    editor.select([a, label]);
    point_at(&mut editor, 0.0, 0.0);
    editor.trigger("mousedown right node");
    point_at(&mut editor, 30.0, 30.0);

    // the label renders relative to the dot, so only the dot moves
    assert_eq!(editor.graph.node(a).unwrap().origin, Vec2::new(30.0, 30.0));
    assert_eq!(
        editor.graph.node(label).unwrap().origin,
        Vec2::new(10.0, 10.0)
    );
}

#[test]
fn moving_with_nothing_selected_grabs_the_hovered_entity() {
    let mut editor = GraphEditor::new();
    let (a, _) = two_dots(&mut editor);

    point_at(&mut editor, 0.0, 0.0);
    editor.trigger("mousedown right node");
    assert_eq!(editor.selected(), &BTreeSet::from([a]));
}

#[test]
fn double_click_on_a_dot_creates_a_self_loop() {
    let mut editor = GraphEditor::new();
    let a = editor.add_dot(Vec2::new(40.0, 40.0));

    point_at(&mut editor, 40.0, 40.0);
    editor.trigger("dblclick node");

    let link = editor.graph.nodes().find(|n| n.is_link()).unwrap();
    assert_eq!(link.source, Some(a));
    assert_eq!(link.target, Some(a));
    assert_eq!(editor.state(), EditorState::NodeMode);
}

#[test]
fn double_click_on_a_label_starts_text_editing() {
    let mut editor = GraphEditor::new();
    let a = editor.add_dot(Vec2::ZERO);
    let label = a + 1;

    point_at(&mut editor, 15.0, 15.0);
    editor.trigger("dblclick node");
    assert_eq!(editor.editing_label(), Some(label));
    assert_eq!(editor.selected(), &BTreeSet::from([label]));

    editor.set_edited_text("renamed");
    assert_eq!(editor.graph.node(a).unwrap().tag("Label"), Some("renamed"));

    editor.trigger("esc");
    assert_eq!(editor.editing_label(), None);
}

#[test]
fn bare_labels_land_at_the_kind_specific_offset() {
    let mut editor = GraphEditor::new();
    let (a, b) = two_dots(&mut editor);
    let l = editor.add_link(a, b, false);

    let on_dot = editor.add_label(a);
    let on_link = editor.add_label(l);
    assert_eq!(
        editor.graph.node(on_dot).unwrap().origin,
        Vec2::new(10.0, 10.0)
    );
    assert_eq!(
        editor.graph.node(on_link).unwrap().origin,
        Vec2::new(10.0, 0.0)
    );
}

#[test]
fn deleting_a_dot_takes_its_wiring_and_stale_references_along() {
    let mut editor = GraphEditor::new();
    let (a, b) = two_dots(&mut editor);
    let l = editor.add_link(a, b, false);

    point_at(&mut editor, 0.0, 0.0);
    editor.select([a]);
    editor.delete_selected();

    assert!(editor.graph.node(a).is_none());
    assert!(editor.graph.node(l).is_none());
    assert!(editor.graph.node(b).is_some());
    assert!(editor.selected().is_empty());
    assert_eq!(editor.hovered(), None);
}

#[test]
fn failed_load_leaves_the_session_untouched() {
    let mut editor = GraphEditor::new();
    editor.add_dot(Vec2::ZERO);
    let before = editor.export_text();

    let data = GraphData::parse("header\nlink\t|\t9\t|\t7\t|\t8\t|\tLabel: \"->\"\n").unwrap();
    assert!(editor.load_from_data(&data).is_err());
    assert_eq!(editor.export_text(), before);
}

#[test]
fn load_replaces_the_whole_session() {
    let mut editor = GraphEditor::new();
    editor.add_dot(Vec2::ZERO);
    let everything: Vec<_> = editor.graph.nodes().map(|n| n.id()).collect();
    editor.select(everything);

    let data = GraphData::parse(
        "header\n\
         dot\t|\t1\t|\t0\t|\t0\t|\tLabel: \"x\"; Position: \"5,5\"\n",
    )
    .unwrap();
    editor.load_from_data(&data).unwrap();

    assert_eq!(editor.graph.len(), 1);
    assert!(editor.selected().is_empty());
    assert_eq!(editor.state(), EditorState::NodeMode);
}

#[test]
fn esc_drops_selection_and_pending_gesture_state() {
    let mut editor = GraphEditor::new();
    let (a, _) = two_dots(&mut editor);
    editor.select([a]);

    editor.trigger("esc");
    assert!(editor.selected().is_empty());
    assert_eq!(editor.connecting_start(), None);
}
