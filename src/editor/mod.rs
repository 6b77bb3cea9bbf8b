//! Editor session: owns the graph, the interaction machine, and the
//! selection/hover/gesture state, and turns machine output events into
//! graph mutations.

use std::collections::BTreeSet;
use std::path::Path;

use log::{debug, info};

use crate::codec::{self, CodecError, GraphData};
use crate::draw::{Canvas, ViewState};
use crate::geom::{Rect, Vec2};
use crate::graph::{Graph, NodeId};
use crate::logic::{EditorLogic, EditorState, OutputEvent, TriggerContext};

#[cfg(test)]
mod tests;

/// Relative placement of the auto-created label on a fresh dot.
const DOT_LABEL_OFFSET: Vec2 = Vec2 { x: 10.0, y: 10.0 };
/// Relative placement of the auto-created label on a fresh link.
const LINK_LABEL_OFFSET: Vec2 = Vec2 { x: 10.0, y: 0.0 };

/// The interactive editing session over one diagram.
///
/// All fields that were ambient globals in earlier iterations of this
/// design (selection, hover, connect-in-progress) live here and reset
/// together with the session.
pub struct GraphEditor {
    pub graph: Graph,
    logic: EditorLogic,
    selected: BTreeSet<NodeId>,
    hovered: Option<NodeId>,
    selecting_rect: Option<Rect>,
    connecting_start: Option<NodeId>,
    editing_label: Option<NodeId>,
    /// Modifier state supplied by the host: new links get the reverse
    /// direction too.
    pub linking_both_ways: bool,
    moving: bool,
    move_origin: Vec2,
    mouse: Vec2,
}

impl Default for GraphEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphEditor {
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            logic: EditorLogic::new(),
            selected: BTreeSet::new(),
            hovered: None,
            selecting_rect: None,
            connecting_start: None,
            editing_label: None,
            linking_both_ways: false,
            moving: false,
            move_origin: Vec2::ZERO,
            mouse: Vec2::ZERO,
        }
    }

    pub fn state(&self) -> EditorState {
        self.logic.state()
    }

    pub fn is_rect_selecting(&self) -> bool {
        self.logic.is_rect_selecting()
    }

    pub fn is_connecting(&self) -> bool {
        self.logic.is_connecting()
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn selected(&self) -> &BTreeSet<NodeId> {
        &self.selected
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    pub fn editing_label(&self) -> Option<NodeId> {
        self.editing_label
    }

    pub fn connecting_start(&self) -> Option<NodeId> {
        self.connecting_start
    }

    pub fn view(&self) -> ViewState<'_> {
        ViewState {
            mouse: self.mouse,
            selected: &self.selected,
            hovered: self.hovered,
            selecting_rect: self.selecting_rect,
            connecting_from: self.connecting_start,
        }
    }

    /// Feeds one gesture token through the machine, performs the emitted
    /// event, then drains any deferred tokens the handlers queued.
    pub fn trigger(&mut self, token: &str) {
        let mut event = self.logic.step(token, &self.context());
        loop {
            if let Some(event) = event {
                self.perform(event);
            }
            match self.logic.take_queued() {
                Some(next) => event = self.logic.step(&next, &self.context()),
                None => break,
            }
        }
    }

    fn context(&self) -> TriggerContext {
        TriggerContext {
            hovered_label: self
                .hovered
                .and_then(|id| self.graph.node(id))
                .map(|n| n.is_label())
                .unwrap_or(false),
        }
    }

    fn perform(&mut self, event: OutputEvent) {
        debug!("perform {event:?}");
        match event {
            OutputEvent::DeselectAll => {
                self.editing_label = None;
                self.connecting_start = None;
                self.selected.clear();
            }
            OutputEvent::CreateNode => {
                self.add_dot(self.mouse);
            }
            OutputEvent::CreateLoop => {
                if let Some(id) = self.hovered {
                    if self.graph.node(id).map(|n| n.can_connect).unwrap_or(false) {
                        self.add_link(id, id, false);
                    }
                }
                self.logic.queue("esc");
            }
            OutputEvent::CancelSelect => {
                self.selected.clear();
                self.selecting_rect = None;
            }
            OutputEvent::CancelConnect => {
                self.connecting_start = None;
            }
            OutputEvent::StartRectSelect => {
                self.selecting_rect = Some(Rect::new(self.mouse.x, self.mouse.y, 1.0, 1.0));
            }
            OutputEvent::EndRectSelect => {
                if let Some(rect) = self.selecting_rect.take() {
                    self.selected = self.graph.nodes_in_rect(rect).into_iter().collect();
                }
                self.logic.queue("");
            }
            OutputEvent::StartConnect => {
                let start = self
                    .hovered
                    .filter(|&id| self.graph.node(id).map(|n| n.can_connect).unwrap_or(false));
                self.connecting_start = start;
                if start.is_none() {
                    self.logic.queue("esc");
                }
            }
            OutputEvent::EndConnect => {
                if let (Some(start), Some(end)) = (self.connecting_start, self.hovered) {
                    let connectable = self
                        .graph
                        .node(end)
                        .map(|n| n.can_connect)
                        .unwrap_or(false);
                    if end != start && connectable {
                        self.add_link(start, end, self.linking_both_ways);
                    }
                }
                self.connecting_start = None;
                self.logic.queue("");
            }
            OutputEvent::StartMoving => {
                if self.selected.is_empty() {
                    if let Some(id) = self.hovered {
                        self.selected.insert(id);
                    }
                }
                // fresh gesture, no link has been displaced yet
                let ids: Vec<NodeId> = self.selected.iter().copied().collect();
                for id in ids {
                    self.graph.set_side_moved(id, false);
                }
                self.moving = true;
                self.move_origin = self.mouse;
            }
            OutputEvent::CancelMoving => {
                self.moving = false;
            }
            OutputEvent::EnterTextEdit => {
                let label = self
                    .hovered
                    .filter(|&id| self.graph.node(id).map(|n| n.is_label()).unwrap_or(false));
                match label {
                    Some(id) => {
                        self.selected.clear();
                        self.selected.insert(id);
                        self.editing_label = Some(id);
                    }
                    None => self.logic.queue("esc"),
                }
            }
            OutputEvent::CancelTextEdit => {
                self.editing_label = None;
            }
        }
    }

    /// Updates the pointer position, recomputes hover, and applies the
    /// drag delta to the selection when a move gesture is active. Returns
    /// the delta actually applied.
    pub fn update_mouse_position(&mut self, position: Vec2, canvas: &dyn Canvas) -> Vec2 {
        self.mouse = position;
        self.hovered = self.graph.node_at(position, canvas);

        if let Some(rect) = self.selecting_rect.as_mut() {
            rect.w = position.x - rect.x;
            rect.h = position.y - rect.y;
        }

        if !self.moving {
            return Vec2::ZERO;
        }

        let delta = position - self.move_origin;
        self.move_origin = position;

        let ids: Vec<NodeId> = self.selected.iter().copied().collect();

        // Links dragged directly must not also follow their endpoints, or
        // the delta would land on them twice.
        for &id in &ids {
            self.graph.set_side_moved(id, true);
        }
        for &id in &ids {
            if self.label_with_selected_source(id) {
                continue;
            }
            self.graph.move_node(id, delta);
        }
        for &id in &ids {
            self.graph.set_side_moved(id, false);
        }

        delta
    }

    /// A selected label whose source is also selected must not move on its
    /// own: it renders relative to the source, so moving both would apply
    /// the delta twice.
    fn label_with_selected_source(&self, id: NodeId) -> bool {
        let Some(node) = self.graph.node(id) else {
            return false;
        };
        node.is_label() && node.source.map_or(false, |s| self.selected.contains(&s))
    }

    /// Creates a dot with its attached label at `position`; returns the
    /// dot's id.
    pub fn add_dot(&mut self, position: Vec2) -> NodeId {
        let dot = self.graph.add_dot(position);
        self.graph.add_label(dot, DOT_LABEL_OFFSET);
        dot
    }

    /// Creates a link (with label) between two existing entities; returns
    /// the link's id.
    pub fn add_link(&mut self, source: NodeId, target: NodeId, both_ways: bool) -> NodeId {
        let link = self.graph.add_link(source, target, both_ways);
        self.graph.add_label(link, LINK_LABEL_OFFSET);
        link
    }

    /// Attaches a bare label to an existing entity, at the same offset the
    /// factory methods use for that kind.
    pub fn add_label(&mut self, source: NodeId) -> NodeId {
        let offset = match self.graph.node(source) {
            Some(n) if n.is_dot() => DOT_LABEL_OFFSET,
            _ => LINK_LABEL_OFFSET,
        };
        self.graph.add_label(source, offset)
    }

    /// Replaces the selection.
    pub fn select(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.selected = ids.into_iter().collect();
    }

    /// Deletes the selection plus everything that depends on it.
    pub fn delete_selected(&mut self) {
        let removed = self.graph.remove_cascading(&self.selected);
        self.selected.clear();
        if self.hovered.map_or(false, |id| removed.contains(&id)) {
            self.hovered = None;
        }
        if self.connecting_start.map_or(false, |id| removed.contains(&id)) {
            self.connecting_start = None;
        }
        if self.editing_label.map_or(false, |id| removed.contains(&id)) {
            self.editing_label = None;
        }
    }

    /// Loads a diagram, replacing the session only if the whole file
    /// parses and resolves. A failed load leaves the current session
    /// untouched.
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<(), CodecError> {
        let data = GraphData::load(path)?;
        self.load_from_data(&data)
    }

    pub fn load_from_data(&mut self, data: &GraphData) -> Result<(), CodecError> {
        let graph = codec::build_graph(data)?;
        self.reset();
        self.graph = graph;
        info!("installed graph with {} node(s)", self.graph.len());
        Ok(())
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), CodecError> {
        codec::save(&self.graph, path)
    }

    pub fn export_text(&self) -> String {
        codec::to_text(&self.graph)
    }

    /// Back to an empty session: fresh graph, idle machine, cleared
    /// selection and gesture state.
    pub fn reset(&mut self) {
        self.graph.clear();
        self.logic.reset();
        self.selected.clear();
        self.hovered = None;
        self.selecting_rect = None;
        self.connecting_start = None;
        self.editing_label = None;
        self.moving = false;
        self.move_origin = Vec2::ZERO;
    }

    /// Draws the diagram and gesture overlays with session state passed
    /// explicitly.
    pub fn draw(&mut self, canvas: &mut dyn Canvas) {
        let view = ViewState {
            mouse: self.mouse,
            selected: &self.selected,
            hovered: self.hovered,
            selecting_rect: self.selecting_rect,
            connecting_from: self.connecting_start,
        };
        self.graph.draw(canvas, &view);
    }

    /// Edits the text of the label currently in text-edit mode; the new
    /// text bridges through to the labelled entity.
    pub fn set_edited_text(&mut self, text: &str) {
        if let Some(id) = self.editing_label {
            self.graph.add_tag(id, "Label", text);
        }
    }
}
