//! Interaction state machine: raw gesture tokens in, semantic editor
//! events out.
//!
//! Exactly one mode is active at any time. Each mode owns a transition
//! table from gesture tokens (`"mousedown left node"`, `"esc"`, …) to the
//! next mode; a token with no entry is a no-op. The event a transition
//! emits depends on the mode the machine came *from*, so the same token
//! can mean different things (`"esc"` deselects in node mode but cancels
//! an in-progress connect).
//!
//! Handlers never re-enter the machine. A follow-up gesture implied by the
//! current one ("this connect failed, behave like `esc`") is pushed onto a
//! FIFO which the session drains after the current token is done.

use std::collections::{HashMap, VecDeque};

use log::debug;
use serde::{Deserialize, Serialize};

#[cfg(test)]
mod tests;

/// Editor interaction modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditorState {
    /// Default idle mode.
    NodeMode,
    /// A selection rectangle is being dragged open.
    RectSelect,
    /// A connection rubber band is attached to the pointer.
    Connect,
    /// Transient pass-through; settles back to `NodeMode` on the empty
    /// token.
    Invalidation,
}

/// Semantic editor actions emitted by transitions, consumed by the
/// session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEvent {
    DeselectAll,
    StartMoving,
    CancelMoving,
    CreateNode,
    CreateLoop,
    CancelSelect,
    CancelConnect,
    StartRectSelect,
    EndRectSelect,
    StartConnect,
    EndConnect,
    EnterTextEdit,
    CancelTextEdit,
}

/// Facts about the pointer target the machine cannot know on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerContext {
    /// The hovered entity, if any, is a label.
    pub hovered_label: bool,
}

pub struct EditorLogic {
    current: EditorState,
    tables: HashMap<EditorState, HashMap<&'static str, EditorState>>,
    queued: VecDeque<String>,
}

impl Default for EditorLogic {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorLogic {
    pub fn new() -> Self {
        let mut logic = Self {
            current: EditorState::NodeMode,
            tables: HashMap::new(),
            queued: VecDeque::new(),
        };

        use EditorState::*;
        logic.connect(NodeMode, "esc", NodeMode);
        logic.connect(NodeMode, "dblclick empty", NodeMode);
        logic.connect(NodeMode, "dblclick node", NodeMode);
        logic.connect(NodeMode, "mousedown left empty", RectSelect);
        logic.connect(NodeMode, "mousedown left node", Connect);
        logic.connect(NodeMode, "mousedown right empty", NodeMode);
        logic.connect(NodeMode, "mousedown right node", NodeMode);
        logic.connect(NodeMode, "mouseup right empty", NodeMode);
        logic.connect(NodeMode, "mouseup right node", NodeMode);

        logic.connect(RectSelect, "esc", NodeMode);
        logic.connect(RectSelect, "mouseup left empty", Invalidation);
        logic.connect(RectSelect, "mouseup left node", Invalidation);

        logic.connect(Connect, "esc", NodeMode);
        logic.connect(Connect, "mouseup left empty", NodeMode);
        logic.connect(Connect, "mouseup left node", Invalidation);

        logic.connect(Invalidation, "", NodeMode);

        logic
    }

    fn connect(&mut self, from: EditorState, token: &'static str, to: EditorState) {
        self.tables.entry(from).or_default().insert(token, to);
    }

    pub fn state(&self) -> EditorState {
        self.current
    }

    pub fn is_rect_selecting(&self) -> bool {
        self.current == EditorState::RectSelect
    }

    pub fn is_connecting(&self) -> bool {
        self.current == EditorState::Connect
    }

    /// Defers a token until the current one has been fully handled.
    pub fn queue(&mut self, token: impl Into<String>) {
        self.queued.push_back(token.into());
    }

    /// Next deferred token, if any. The session pops and re-steps until
    /// the queue is empty.
    pub fn take_queued(&mut self) -> Option<String> {
        self.queued.pop_front()
    }

    /// Performs exactly one transition. Returns the event the entered
    /// mode emits for this (previous mode, token) pair, if any. Unmapped
    /// tokens leave the mode unchanged and emit nothing.
    pub fn step(&mut self, token: &str, ctx: &TriggerContext) -> Option<OutputEvent> {
        let next = self
            .tables
            .get(&self.current)
            .and_then(|table| table.get(token))
            .copied();
        let Some(next) = next else {
            debug!("{:?} -[{token}]-> (no-op)", self.current);
            return None;
        };

        debug!("{:?} -[{token}]-> {next:?}", self.current);
        let from = self.current;
        self.current = next;
        Self::on_enter(next, from, token, ctx)
    }

    fn on_enter(
        entered: EditorState,
        from: EditorState,
        token: &str,
        ctx: &TriggerContext,
    ) -> Option<OutputEvent> {
        use EditorState::*;
        use OutputEvent::*;

        match entered {
            NodeMode => match from {
                NodeMode => match token {
                    "esc" => Some(DeselectAll),
                    "dblclick empty" => Some(CreateNode),
                    "dblclick node" => {
                        if ctx.hovered_label {
                            Some(EnterTextEdit)
                        } else {
                            Some(CreateLoop)
                        }
                    }
                    t if t.starts_with("mousedown right") => Some(StartMoving),
                    t if t.starts_with("mouseup right") => Some(CancelMoving),
                    _ => None,
                },
                RectSelect => (token == "esc").then_some(CancelSelect),
                Connect => {
                    (token == "esc" || token == "mouseup left empty").then_some(CancelConnect)
                }
                Invalidation => None,
            },
            RectSelect => {
                (from == NodeMode && token == "mousedown left empty").then_some(StartRectSelect)
            }
            Connect => (from == NodeMode && token == "mousedown left node").then_some(StartConnect),
            Invalidation => match from {
                Connect => (token == "mouseup left node").then_some(EndConnect),
                RectSelect => token.starts_with("mouseup").then_some(EndRectSelect),
                _ => None,
            },
        }
    }

    /// Back to idle; any deferred tokens are dropped.
    pub fn reset(&mut self) {
        self.current = EditorState::NodeMode;
        self.queued.clear();
    }
}
