//! Entity graph model: dots, links and labels plus the reactive wiring
//! between them.
//!
//! All mutation goes through [`Graph`] so that cross-entity reactions fire
//! exactly once per change: moving a link endpoint repositions the link's
//! midpoint offset, and editing a label's text writes it back to the node
//! the label annotates. Reactions are explicit observer registrations made
//! at construction time and dispatched in insertion order.

use std::collections::{BTreeSet, HashMap};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geom::{Rect, Vec2};
use crate::draw::Tint;


pub type NodeId = u32;

/// Horizontal offset applied to a fresh self-loop so it does not sit on
/// top of its own endpoint.
const SELF_LOOP_OFFSET: f32 = 30.0;

/// The closed set of entity kinds placed on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Dot,
    Link,
    Label,
}

/// How a tag write changed the tag map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagChange {
    Added,
    Removed,
    Edited,
}

/// A reaction registered on a node when a dependent entity is created.
#[derive(Debug, Clone, Copy)]
enum Observer {
    /// A link whose endpoint is the observed node; endpoint moves shift
    /// the link by half the delta, preserving its offset from the new
    /// midpoint.
    LinkFollow(NodeId),
    /// The node mirrored by the observed label: edits to the label's
    /// "Label" tag are written through, one direction only.
    LabelBridge(NodeId),
}

/// A single drawable entity. Common fields are shared by every kind;
/// `source`/`target` are `None` unless the entity depends on another one.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    pub kind: NodeKind,
    pub origin: Vec2,
    /// Draw order priority; higher depths are drawn first (further back).
    pub depth: i32,
    /// Serialization ordering priority, see the codec module.
    pub export_depth: i32,
    pub alive: bool,
    pub can_connect: bool,
    pub can_delete: bool,
    pub source: Option<NodeId>,
    pub target: Option<NodeId>,
    /// Links only: the link also carries the reverse transition.
    pub both_ways: bool,
    pub tint: Tint,
    /// Links only: set while a drag gesture moves this link directly, so
    /// endpoint-move reactions must not shift it a second time.
    side_moved: bool,
    tags: Vec<(String, String)>,
    last_bounds: Rect,
}

impl Node {
    fn new(kind: NodeKind, id: NodeId, origin: Vec2, can_connect: bool, can_delete: bool) -> Self {
        Self {
            id,
            kind,
            origin,
            depth: 0,
            export_depth: 0,
            alive: true,
            can_connect,
            can_delete,
            source: None,
            target: None,
            both_ways: false,
            tint: Tint::Background,
            side_moved: false,
            tags: Vec::new(),
            last_bounds: Rect::default(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn is_dot(&self) -> bool {
        self.kind == NodeKind::Dot
    }

    pub fn is_link(&self) -> bool {
        self.kind == NodeKind::Link
    }

    pub fn is_label(&self) -> bool {
        self.kind == NodeKind::Label
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn tag_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.tag(key).unwrap_or(default)
    }

    /// Tags in insertion order. An edit keeps the original position.
    pub fn tags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Bounds as of the last [`Graph::bounds`] call.
    pub fn cached_bounds(&self) -> Rect {
        self.last_bounds
    }

    fn set_tag(&mut self, key: &str, value: &str) -> TagChange {
        match self.tags.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => {
                entry.1 = value.to_string();
                TagChange::Edited
            }
            None => {
                self.tags.push((key.to_string(), value.to_string()));
                TagChange::Added
            }
        }
    }
}

/// Insertion-ordered arena of live entities and their observer wiring.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
    observers: HashMap<NodeId, Vec<Observer>>,
    next_id: NodeId,
    next_dot_tag: u32,
}

/// Spreadsheet-style label for the nth dot: `a`..`z`, then `aa`, `ab`, …
fn dot_label(mut n: u32) -> String {
    let mut label = String::new();
    loop {
        label.insert(0, (b'a' + (n % 26) as u8) as char);
        n /= 26;
        if n == 0 {
            break;
        }
        n -= 1;
    }
    label
}

impl Graph {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            observers: HashMap::new(),
            next_id: 1,
            next_dot_tag: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        match self.index.get(&id).copied() {
            Some(i) => Some(&mut self.nodes[i]),
            None => None,
        }
    }

    /// All live entities in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Entities in draw order: deepest first, insertion order within a
    /// depth. The topmost entity under a point is the last drawn one.
    pub fn draw_order(&self) -> Vec<NodeId> {
        let mut ids: Vec<&Node> = self.nodes.iter().collect();
        ids.sort_by(|a, b| b.depth.cmp(&a.depth));
        ids.into_iter().map(|n| n.id).collect()
    }

    fn insert(&mut self, mut node: Node) -> NodeId {
        let id = node.id;
        node.last_bounds = self.seed_bounds(&node);
        self.index.insert(id, self.nodes.len());
        self.nodes.push(node);
        self.next_id = self.next_id.max(id + 1);
        id
    }

    /// First cached bounds for a fresh entity, so canvas-free queries see
    /// it before any draw or hover pass refreshes the cache. Dots and
    /// links get their exact box; labels get the minimum box, refined once
    /// their text is measured.
    fn seed_bounds(&self, node: &Node) -> Rect {
        match node.kind {
            NodeKind::Dot | NodeKind::Link => {
                Rect::new(node.origin.x - 10.0, node.origin.y - 10.0, 20.0, 20.0)
            }
            NodeKind::Label => {
                let anchor = node
                    .source
                    .and_then(|s| self.node(s))
                    .map(|s| s.origin)
                    .unwrap_or_default();
                Rect::new(anchor.x + node.origin.x, anchor.y + node.origin.y, 10.0, 14.0)
            }
        }
    }

    fn alloc_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Creates a connectable dot, auto-tagged `a`, `b`, `c`, … in creation
    /// order, continuing with `aa`, `ab`, … past `z`.
    pub fn add_dot(&mut self, origin: Vec2) -> NodeId {
        let id = self.alloc_id();
        let mut node = Node::new(NodeKind::Dot, id, origin, true, true);
        node.depth = 1;
        node.export_depth = 2;
        let tag = dot_label(self.next_dot_tag);
        self.next_dot_tag += 1;
        node.set_tag("Label", &tag);
        self.insert(node);
        self.stamp_position(id);
        debug!("add dot {id} at {origin:?}");
        id
    }

    /// Creates a link between two existing entities. A self-loop is nudged
    /// sideways so it stays selectable next to its endpoint.
    pub fn add_link(&mut self, source: NodeId, target: NodeId, both_ways: bool) -> NodeId {
        let a = self.node(source).map(|n| n.origin).unwrap_or_default();
        let b = self.node(target).map(|n| n.origin).unwrap_or_default();
        let mut origin = (a + b) * 0.5;
        if source == target {
            origin.x += SELF_LOOP_OFFSET;
        }

        let id = self.alloc_id();
        let mut node = Node::new(NodeKind::Link, id, origin, true, true);
        node.depth = 1;
        node.export_depth = 1;
        node.source = Some(source);
        node.target = Some(target);
        node.both_ways = both_ways;
        node.set_tag("Label", if both_ways { "<->" } else { "->" });
        if both_ways {
            node.set_tag("BothWays", "true");
        }
        self.insert(node);
        self.stamp_position(id);

        self.observe(source, Observer::LinkFollow(id));
        self.observe(target, Observer::LinkFollow(id));
        debug!("add link {id}: {source} -> {target} (both_ways: {both_ways})");
        id
    }

    /// Creates a label annotating `source`, positioned at `offset` relative
    /// to it. Every label has a source; there is no detached variant.
    pub fn add_label(&mut self, source: NodeId, offset: Vec2) -> NodeId {
        let text = self
            .node(source)
            .and_then(|n| n.tag("Label"))
            .unwrap_or_default()
            .to_string();

        let id = self.alloc_id();
        let mut node = Node::new(NodeKind::Label, id, offset, false, false);
        node.depth = 0;
        node.export_depth = 0;
        node.source = Some(source);
        node.set_tag("Label", &text);
        self.insert(node);
        self.stamp_position(id);

        self.observe(id, Observer::LabelBridge(source));
        debug!("add label {id} on {source}");
        id
    }

    fn observe(&mut self, observed: NodeId, observer: Observer) {
        self.observers.entry(observed).or_default().push(observer);
    }

    fn stamp_position(&mut self, id: NodeId) {
        if let Some(origin) = self.node(id).map(|n| n.origin) {
            self.add_tag(id, "Position", &format!("{},{}", origin.x, origin.y));
        }
    }

    /// Moves an entity and lets its observers react: links attached to the
    /// moved entity keep their visual offset from the new midpoint by
    /// shifting half the delta, unless the drag gesture is moving the link
    /// directly (see [`Graph::set_side_moved`]).
    pub fn move_node(&mut self, id: NodeId, delta: Vec2) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        node.origin += delta;
        self.stamp_position(id);

        let watchers: Vec<Observer> = self.observers.get(&id).cloned().unwrap_or_default();
        for watcher in watchers {
            if let Observer::LinkFollow(link) = watcher {
                let skip = self.node(link).map(|n| n.side_moved).unwrap_or(true);
                if !skip {
                    self.move_node(link, delta * 0.5);
                }
            }
        }
    }

    /// Writes a tag and dispatches the change. Editing a label's "Label"
    /// tag is bridged to the annotated node; the reverse direction is
    /// deliberately not wired, which keeps the propagation loop-free.
    pub fn add_tag(&mut self, id: NodeId, key: &str, value: &str) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        let change = node.set_tag(key, value);

        if change == TagChange::Edited && key == "Label" {
            let watchers: Vec<Observer> = self.observers.get(&id).cloned().unwrap_or_default();
            for watcher in watchers {
                if let Observer::LabelBridge(source) = watcher {
                    self.add_tag(source, "Label", value);
                }
            }
        }
    }

    pub fn remove_tag(&mut self, id: NodeId, key: &str) {
        if let Some(node) = self.node_mut(id) {
            node.tags.retain(|(k, _)| k != key);
        }
    }

    /// Marks a link as moved directly by the current drag batch so that
    /// endpoint-move reactions skip it.
    pub fn set_side_moved(&mut self, id: NodeId, moved: bool) {
        if let Some(node) = self.node_mut(id) {
            if node.is_link() {
                node.side_moved = moved;
            }
        }
    }

    /// Removes the given entities plus everything whose source or target
    /// falls inside the removal set, transitively. Returns the full set of
    /// removed ids.
    pub fn remove_cascading(&mut self, seeds: &BTreeSet<NodeId>) -> BTreeSet<NodeId> {
        let mut doomed: BTreeSet<NodeId> = seeds
            .iter()
            .copied()
            .filter(|id| self.index.contains_key(id))
            .collect();

        loop {
            let mut grew = false;
            for node in &self.nodes {
                if doomed.contains(&node.id) {
                    continue;
                }
                let dependent = node.source.map_or(false, |s| doomed.contains(&s))
                    || node.target.map_or(false, |t| doomed.contains(&t));
                if dependent {
                    doomed.insert(node.id);
                    grew = true;
                }
            }
            if !grew {
                break;
            }
        }

        for node in &mut self.nodes {
            if doomed.contains(&node.id) {
                node.alive = false;
            }
        }
        self.nodes.retain(|n| n.alive);
        self.observers.retain(|observed, _| !doomed.contains(observed));
        for watchers in self.observers.values_mut() {
            watchers.retain(|w| match w {
                Observer::LinkFollow(id) | Observer::LabelBridge(id) => !doomed.contains(id),
            });
        }
        self.reindex();

        debug!("removed {} node(s)", doomed.len());
        doomed
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (i, node) in self.nodes.iter().enumerate() {
            self.index.insert(node.id, i);
        }
    }

    /// Restores the empty post-construction state, including the id and
    /// auto-label counters.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
        self.observers.clear();
        self.next_id = 1;
        self.next_dot_tag = 0;
    }

    pub(crate) fn register_link_follow(&mut self, endpoint: NodeId, link: NodeId) {
        self.observe(endpoint, Observer::LinkFollow(link));
    }

    pub(crate) fn register_label_bridge(&mut self, label: NodeId, source: NodeId) {
        self.observe(label, Observer::LabelBridge(source));
    }

    pub(crate) fn insert_raw(&mut self, node: Node) -> NodeId {
        self.insert(node)
    }

    pub(crate) fn make_node(
        kind: NodeKind,
        id: NodeId,
        origin: Vec2,
        can_connect: bool,
        can_delete: bool,
    ) -> Node {
        Node::new(kind, id, origin, can_connect, can_delete)
    }

    pub(crate) fn bump_dot_tag(&mut self) {
        self.next_dot_tag += 1;
    }

    pub(crate) fn set_tag_silent(&mut self, id: NodeId, key: &str, value: &str) {
        if let Some(node) = self.node_mut(id) {
            node.set_tag(key, value);
        }
    }

    pub(crate) fn set_last_bounds(&mut self, id: NodeId, bounds: Rect) {
        if let Some(node) = self.node_mut(id) {
            node.last_bounds = bounds;
        }
    }
}
