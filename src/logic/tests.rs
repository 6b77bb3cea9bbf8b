//! Unit tests for the interaction state machine.

use crate::logic::{EditorLogic, EditorState, OutputEvent, TriggerContext};

fn ctx() -> TriggerContext {
    TriggerContext::default()
}

#[test]
fn starts_idle() {
    let logic = EditorLogic::new();
    assert_eq!(logic.state(), EditorState::NodeMode);
}

#[test]
fn unmapped_tokens_are_ignored() {
    let mut logic = EditorLogic::new();
    assert_eq!(logic.step("mouseup left empty", &ctx()), None);
    assert_eq!(logic.step("no such gesture", &ctx()), None);
    assert_eq!(logic.state(), EditorState::NodeMode);
}

#[test]
fn rect_select_round_trip_emits_each_event_once() {
    let mut logic = EditorLogic::new();

    assert_eq!(
        logic.step("mousedown left empty", &ctx()),
        Some(OutputEvent::StartRectSelect)
    );
    assert_eq!(logic.state(), EditorState::RectSelect);

    assert_eq!(
        logic.step("mouseup left empty", &ctx()),
        Some(OutputEvent::EndRectSelect)
    );
    assert_eq!(logic.state(), EditorState::Invalidation);

    // the empty token settles the transient mode without a second event
    assert_eq!(logic.step("", &ctx()), None);
    assert_eq!(logic.state(), EditorState::NodeMode);
}

#[test]
fn rect_select_over_a_node_still_ends_the_selection() {
    let mut logic = EditorLogic::new();
    logic.step("mousedown left empty", &ctx());
    assert_eq!(
        logic.step("mouseup left node", &ctx()),
        Some(OutputEvent::EndRectSelect)
    );
}

#[test]
fn esc_cancels_an_open_rect_select() {
    let mut logic = EditorLogic::new();
    logic.step("mousedown left empty", &ctx());
    assert_eq!(logic.step("esc", &ctx()), Some(OutputEvent::CancelSelect));
    assert_eq!(logic.state(), EditorState::NodeMode);
}

#[test]
fn connect_completes_only_over_a_node() {
    let mut logic = EditorLogic::new();

    assert_eq!(
        logic.step("mousedown left node", &ctx()),
        Some(OutputEvent::StartConnect)
    );
    assert!(logic.is_connecting());

    assert_eq!(
        logic.step("mouseup left node", &ctx()),
        Some(OutputEvent::EndConnect)
    );
    assert_eq!(logic.state(), EditorState::Invalidation);
    logic.step("", &ctx());
    assert_eq!(logic.state(), EditorState::NodeMode);
}

#[test]
fn releasing_over_empty_space_cancels_the_connect() {
    let mut logic = EditorLogic::new();
    logic.step("mousedown left node", &ctx());
    assert_eq!(
        logic.step("mouseup left empty", &ctx()),
        Some(OutputEvent::CancelConnect)
    );
    assert_eq!(logic.state(), EditorState::NodeMode);
}

#[test]
fn esc_cancels_an_open_connect() {
    let mut logic = EditorLogic::new();
    logic.step("mousedown left node", &ctx());
    assert_eq!(logic.step("esc", &ctx()), Some(OutputEvent::CancelConnect));
}

#[test]
fn esc_while_idle_deselects() {
    let mut logic = EditorLogic::new();
    assert_eq!(logic.step("esc", &ctx()), Some(OutputEvent::DeselectAll));
}

#[test]
fn double_click_on_empty_space_creates_a_node() {
    let mut logic = EditorLogic::new();
    assert_eq!(
        logic.step("dblclick empty", &ctx()),
        Some(OutputEvent::CreateNode)
    );
}

#[test]
fn double_click_meaning_depends_on_the_hover_target() {
    let mut logic = EditorLogic::new();
    assert_eq!(
        logic.step("dblclick node", &ctx()),
        Some(OutputEvent::CreateLoop)
    );

    let over_label = TriggerContext {
        hovered_label: true,
    };
    assert_eq!(
        logic.step("dblclick node", &over_label),
        Some(OutputEvent::EnterTextEdit)
    );
}

#[test]
fn right_button_drives_the_move_gesture() {
    let mut logic = EditorLogic::new();
    assert_eq!(
        logic.step("mousedown right node", &ctx()),
        Some(OutputEvent::StartMoving)
    );
    assert_eq!(
        logic.step("mouseup right node", &ctx()),
        Some(OutputEvent::CancelMoving)
    );
    assert_eq!(
        logic.step("mousedown right empty", &ctx()),
        Some(OutputEvent::StartMoving)
    );
    assert_eq!(
        logic.step("mouseup right empty", &ctx()),
        Some(OutputEvent::CancelMoving)
    );
}

#[test]
fn queued_tokens_come_back_in_fifo_order() {
    let mut logic = EditorLogic::new();
    logic.queue("esc");
    logic.queue("");
    assert_eq!(logic.take_queued().as_deref(), Some("esc"));
    assert_eq!(logic.take_queued().as_deref(), Some(""));
    assert_eq!(logic.take_queued(), None);
}

#[test]
fn reset_returns_to_idle_and_drops_the_queue() {
    let mut logic = EditorLogic::new();
    logic.step("mousedown left node", &ctx());
    logic.queue("esc");
    logic.reset();
    assert_eq!(logic.state(), EditorState::NodeMode);
    assert_eq!(logic.take_queued(), None);
}
