//! Read-only adjacency view over parsed diagram data.
//!
//! Consumes the structural prefix of a file (dots and links; the first
//! label row ends the scan, since labels carry no structure) and answers
//! degree and neighborhood queries in O(1).

use std::collections::HashMap;

use crate::codec::GraphData;
use crate::graph::NodeKind;
use crate::sparse::SparseSet;

#[cfg(test)]
mod tests;

/// Descriptor for one structural entity, dot or link.
#[derive(Debug, Clone)]
pub struct DigraphNode {
    pub id: u32,
    pub source: u32,
    pub target: u32,
    pub bidirectional: bool,
    pub label: String,
}

impl DigraphNode {
    /// A dot: it relates only to itself.
    pub fn is_identity(&self) -> bool {
        self.source == self.target && self.source == self.id
    }

    /// A link between two distinct entities.
    pub fn is_relation(&self) -> bool {
        self.source != self.target
    }
}

/// Adjacency indices for one diagram.
pub struct Digraph {
    pub dots: SparseSet,
    pub links: SparseSet,
    index: HashMap<u32, DigraphNode>,
    edges_out: HashMap<u32, HashMap<u32, u32>>,
    edges_in: HashMap<u32, HashMap<u32, u32>>,
}

impl Digraph {
    /// Builds the view. Sparse sets are sized to the largest id in the
    /// data so membership stays allocation-free afterwards.
    pub fn from_data(data: &GraphData) -> Self {
        let max_id = data
            .lines
            .iter()
            .map(|l| l.id.max(l.source_id).max(l.target_id))
            .max()
            .unwrap_or(0) as usize;

        let mut digraph = Self {
            dots: SparseSet::new(max_id),
            links: SparseSet::new(max_id),
            index: HashMap::new(),
            edges_out: HashMap::new(),
            edges_in: HashMap::new(),
        };

        for line in &data.lines {
            match line.kind {
                NodeKind::Dot => {
                    digraph.dots.add(line.id as usize);
                    digraph.index.insert(
                        line.id,
                        DigraphNode {
                            id: line.id,
                            source: line.id,
                            target: line.id,
                            bidirectional: false,
                            label: line.tag_or("Label", "").to_string(),
                        },
                    );
                }
                NodeKind::Link => {
                    let node = DigraphNode {
                        id: line.id,
                        source: line.source_id,
                        target: line.target_id,
                        bidirectional: line.tag("BothWays").is_some(),
                        label: line.tag_or("Label", "").to_string(),
                    };
                    digraph.links.add(line.id as usize);
                    digraph.connect(node.source, node.target, line.id);
                    if node.bidirectional {
                        digraph.connect(node.target, node.source, line.id);
                    }
                    digraph.index.insert(line.id, node);
                }
                // labels are sorted last; nothing structural follows
                NodeKind::Label => break,
            }
        }

        digraph
    }

    fn connect(&mut self, from: u32, to: u32, link: u32) {
        self.edges_out.entry(from).or_default().insert(to, link);
        self.edges_in.entry(to).or_default().insert(from, link);
    }

    pub fn node(&self, id: u32) -> Option<&DigraphNode> {
        self.index.get(&id)
    }

    pub fn out_degree(&self, id: u32) -> usize {
        self.edges_out.get(&id).map_or(0, HashMap::len)
    }

    pub fn in_degree(&self, id: u32) -> usize {
        self.edges_in.get(&id).map_or(0, HashMap::len)
    }

    /// Outgoing neighbors of `id` with the link descriptor between them.
    pub fn edges_out(&self, id: u32) -> impl Iterator<Item = (u32, &DigraphNode)> {
        self.edges_out
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|(&neighbor, link)| self.index.get(link).map(|n| (neighbor, n)))
    }

    /// Incoming neighbors of `id` with the link descriptor between them.
    pub fn edges_in(&self, id: u32) -> impl Iterator<Item = (u32, &DigraphNode)> {
        self.edges_in
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|(&neighbor, link)| self.index.get(link).map(|n| (neighbor, n)))
    }
}
