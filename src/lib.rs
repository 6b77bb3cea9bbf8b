//! Dotlink - Node/Edge Diagram Editor Core
//! Diagrams drawn with dots, links and labels double as machine-readable
//! finite-state automata that can be analyzed and executed at runtime.

pub mod codec;
pub mod digraph;
pub mod draw;
pub mod editor;
pub mod fsm;
pub mod geom;
pub mod graph;
pub mod logic;
pub mod sparse;

pub use codec::{CodecError, GraphData, GraphLine};
pub use digraph::Digraph;
pub use draw::{Canvas, Headless, Tint, ViewState};
pub use editor::GraphEditor;
pub use fsm::{Machine, TriggerOutcome};
pub use geom::{Rect, Vec2};
pub use graph::{Graph, Node, NodeId, NodeKind};
pub use logic::{EditorLogic, EditorState, OutputEvent};
pub use sparse::SparseSet;
