//! Drawing boundary: the host supplies a [`Canvas`]; the core decides what
//! to draw and where but never rasterizes anything itself.

use serde::{Deserialize, Serialize};

use crate::geom::{Rect, Vec2};
use crate::graph::{Graph, NodeId, NodeKind};
use std::collections::BTreeSet;

/// Logical palette; the host maps tints to actual colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tint {
    #[default]
    Background,
    DarkGrey,
    LightGrey,
    White,
    Blue,
    Green,
    Red,
    Pink,
    Purple,
    Orange,
    Yellow,
    Cyan,
}

/// Capability surface consumed by entity draw and measure operations.
pub trait Canvas {
    /// Width and height of `text` in canvas units.
    fn measure_text(&self, text: &str) -> Vec2;

    fn draw_circle(&mut self, tint: Tint, center: Vec2, radius: f32);
    fn fill_circle(&mut self, tint: Tint, center: Vec2, radius: f32);
    fn draw_line(&mut self, tint: Tint, from: Vec2, to: Vec2);
    /// Polyline with an arrow head at the end, or at both ends.
    fn draw_arrow(&mut self, tint: Tint, points: &[Vec2], both_ends: bool);
    /// Smooth curve through the given control points; used for self-loops.
    fn draw_arc(&mut self, tint: Tint, points: &[Vec2]);
    fn draw_text(&mut self, tint: Tint, origin: Vec2, text: &str);
    fn draw_rect(&mut self, tint: Tint, rect: Rect);
    fn fill_rect(&mut self, tint: Tint, rect: Rect, alpha: f32);
}

/// Per-frame editor state the renderer needs besides the graph itself.
/// Selection and hover are owned by the session and passed in explicitly.
pub struct ViewState<'a> {
    pub mouse: Vec2,
    pub selected: &'a BTreeSet<NodeId>,
    pub hovered: Option<NodeId>,
    pub selecting_rect: Option<Rect>,
    pub connecting_from: Option<NodeId>,
}

/// A canvas that draws nothing and measures text with fixed metrics.
/// Useful for headless hosts and for hit-testing in tests.
#[derive(Debug, Default)]
pub struct Headless;

impl Canvas for Headless {
    fn measure_text(&self, text: &str) -> Vec2 {
        Vec2::new(text.chars().count() as f32 * 7.0, 14.0)
    }

    fn draw_circle(&mut self, _: Tint, _: Vec2, _: f32) {}
    fn fill_circle(&mut self, _: Tint, _: Vec2, _: f32) {}
    fn draw_line(&mut self, _: Tint, _: Vec2, _: Vec2) {}
    fn draw_arrow(&mut self, _: Tint, _: &[Vec2], _: bool) {}
    fn draw_arc(&mut self, _: Tint, _: &[Vec2]) {}
    fn draw_text(&mut self, _: Tint, _: Vec2, _: &str) {}
    fn draw_rect(&mut self, _: Tint, _: Rect) {}
    fn fill_rect(&mut self, _: Tint, _: Rect, _: f32) {}
}

impl Graph {
    /// Kind-specific bounds. Dots and links are fixed 20x20 boxes around
    /// the origin; a label's box is its measured text floored at 10x14,
    /// positioned relative to its source. The result is cached for
    /// canvas-free queries such as rect selection.
    pub fn bounds(&mut self, id: NodeId, canvas: &dyn Canvas) -> Rect {
        let Some(node) = self.node(id) else {
            return Rect::default();
        };
        let bounds = match node.kind {
            NodeKind::Dot | NodeKind::Link => {
                Rect::new(node.origin.x - 10.0, node.origin.y - 10.0, 20.0, 20.0)
            }
            NodeKind::Label => {
                let anchor = node
                    .source
                    .and_then(|s| self.node(s))
                    .map(|s| s.origin)
                    .unwrap_or_default();
                let text = node.tag_or("Label", "");
                let measure = canvas.measure_text(text);
                Rect::new(
                    anchor.x + node.origin.x,
                    anchor.y + node.origin.y,
                    measure.x.max(10.0),
                    measure.y.max(14.0),
                )
            }
        };
        self.set_last_bounds(id, bounds);
        bounds
    }

    /// Topmost entity under a point, refreshing every cached bounds on the
    /// way. Topmost means last in draw order.
    pub fn node_at(&mut self, point: Vec2, canvas: &dyn Canvas) -> Option<NodeId> {
        let order = self.draw_order();
        let mut hit = None;
        for id in order {
            if self.bounds(id, canvas).contains(point) {
                hit = Some(id);
            }
        }
        hit
    }

    /// Live entities whose cached bounds intersect `rect`.
    pub fn nodes_in_rect(&self, rect: Rect) -> Vec<NodeId> {
        let rect = rect.normalized();
        self.nodes()
            .filter(|n| n.alive && n.cached_bounds().intersects(&rect))
            .map(|n| n.id())
            .collect()
    }

    /// Draws the whole diagram back to front, then the gesture overlays
    /// (selection rubber band, connect preview).
    pub fn draw(&mut self, canvas: &mut dyn Canvas, view: &ViewState<'_>) {
        for id in self.draw_order() {
            self.draw_node(id, canvas, view);
        }

        if let Some(rect) = view.selecting_rect {
            canvas.draw_rect(Tint::LightGrey, rect.normalized());
        }
        if let Some(start) = view.connecting_from {
            if let Some(origin) = self.node(start).map(|n| n.origin) {
                canvas.draw_line(Tint::LightGrey, origin, view.mouse);
            }
        }
    }

    fn draw_node(&mut self, id: NodeId, canvas: &mut dyn Canvas, view: &ViewState<'_>) {
        let bounds = self.bounds(id, canvas);
        let Some(node) = self.node(id) else {
            return;
        };
        let hovered = view.hovered == Some(id);
        let selected = view.selected.contains(&id);

        match node.kind {
            NodeKind::Dot => {
                let origin = node.origin;
                let tint = node.tint;
                canvas.fill_circle(Tint::White, origin, 8.0);
                canvas.fill_circle(tint, origin, 7.0);
                canvas.fill_circle(Tint::White, origin, 6.0);
                canvas.fill_circle(tint, origin, 3.0);
                if hovered {
                    canvas.draw_circle(Tint::White, origin, 10.0);
                }
                if selected {
                    canvas.draw_circle(Tint::Yellow, origin, 12.0);
                }
            }
            NodeKind::Link => {
                let origin = node.origin;
                let both_ways = node.both_ways;
                let a = node.source.and_then(|s| self.node(s)).map(|n| n.origin);
                let b = node.target.and_then(|t| self.node(t)).map(|n| n.origin);
                if let (Some(a), Some(b)) = (a, b) {
                    let path = [a, origin, b];
                    if node.source == node.target {
                        canvas.draw_arc(Tint::White, &path);
                    } else {
                        canvas.draw_arrow(Tint::White, &path, both_ways);
                    }
                }
                canvas.draw_circle(Tint::White, origin, 3.0);
                if hovered {
                    canvas.fill_circle(Tint::White, origin, 4.0);
                }
                if selected {
                    canvas.draw_circle(Tint::Yellow, origin, 6.0);
                }
            }
            NodeKind::Label => {
                let text_origin = Vec2::new(bounds.x, bounds.y);
                let text = node.tag_or("Label", "").to_string();
                if hovered {
                    canvas.fill_rect(Tint::White, bounds.inflate(2.0), 1.0);
                    canvas.draw_text(Tint::DarkGrey, text_origin, &text);
                } else {
                    canvas.fill_rect(Tint::LightGrey, bounds, 0.5);
                    canvas.draw_text(Tint::White, text_origin, &text);
                }
                if selected {
                    canvas.draw_rect(Tint::Yellow, bounds);
                }
            }
        }
    }
}
