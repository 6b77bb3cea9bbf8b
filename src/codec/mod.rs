//! Flat text serialization of diagrams.
//!
//! The format is line oriented: a header row, then one row per entity with
//! five `|`-separated fields (`kind | id | sourceId | targetId | tags`).
//! Tags are `key: "value"` pairs joined by `;`. Positions travel inside a
//! `Position` tag rather than dedicated columns.
//!
//! Export order is chosen so that every entity's source and target appear
//! earlier in the file: entities sort by descending export depth (dots,
//! then links, then labels) and, within a depth, by ascending recursive
//! export weight. Import therefore only ever resolves references against
//! entities it has already materialized.

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geom::Vec2;
use crate::graph::{Graph, NodeId, NodeKind};


#[derive(Error, Debug)]
pub enum CodecError {
    #[error("expected 5 `|`-separated fields (line {line})")]
    MalformedLine { line: usize },
    #[error("unknown node kind `{kind}` (line {line})")]
    UnknownKind { line: usize, kind: String },
    #[error("invalid {field} id `{value}` (line {line})")]
    InvalidId {
        line: usize,
        field: &'static str,
        value: String,
    },
    #[error("malformed tag `{tag}` (line {line})")]
    MalformedTag { line: usize, tag: String },
    #[error("node {id} references node {referenced}, which does not exist yet")]
    DanglingReference { id: u32, referenced: u32 },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One parsed row of the file. Ids of 0 mean "absent".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphLine {
    pub kind: NodeKind,
    pub id: u32,
    pub source_id: u32,
    pub target_id: u32,
    pub tags: Vec<(String, String)>,
}

impl GraphLine {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn tag_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.tag(key).unwrap_or(default)
    }
}

/// The parsed file: rows in file order, header dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphData {
    pub lines: Vec<GraphLine>,
}

impl GraphData {
    /// Parses the whole document. The first line is a header and is not
    /// interpreted. Any malformed row aborts the parse with its 1-based
    /// line number; no partial data is returned.
    pub fn parse(text: &str) -> Result<Self, CodecError> {
        let mut data = GraphData::default();
        for (i, raw) in text.lines().enumerate() {
            let line_no = i + 1;
            if line_no == 1 || raw.trim().is_empty() {
                continue;
            }
            data.lines.push(parse_line(raw, line_no)?);
        }
        Ok(data)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CodecError> {
        let text = fs::read_to_string(path.as_ref())?;
        let data = Self::parse(&text)?;
        info!(
            "loaded {} line(s) from {}",
            data.lines.len(),
            path.as_ref().display()
        );
        Ok(data)
    }
}

fn parse_line(raw: &str, line_no: usize) -> Result<GraphLine, CodecError> {
    let parts: Vec<&str> = raw.splitn(5, '|').map(str::trim).collect();
    if parts.len() != 5 {
        return Err(CodecError::MalformedLine { line: line_no });
    }

    let kind = match parts[0] {
        "dot" => NodeKind::Dot,
        "link" => NodeKind::Link,
        "label" => NodeKind::Label,
        other => {
            return Err(CodecError::UnknownKind {
                line: line_no,
                kind: other.to_string(),
            })
        }
    };

    let id = parse_id(parts[1], "node", line_no)?;
    let source_id = parse_id(parts[2], "source", line_no)?;
    let target_id = parse_id(parts[3], "target", line_no)?;
    let tags = parse_tags(parts[4], line_no)?;

    Ok(GraphLine {
        kind,
        id,
        source_id,
        target_id,
        tags,
    })
}

fn parse_id(text: &str, field: &'static str, line_no: usize) -> Result<u32, CodecError> {
    text.parse().map_err(|_| CodecError::InvalidId {
        line: line_no,
        field,
        value: text.to_string(),
    })
}

fn parse_tags(text: &str, line_no: usize) -> Result<Vec<(String, String)>, CodecError> {
    let mut tags = Vec::new();
    for part in text.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let Some((key, value)) = part.split_once(':') else {
            return Err(CodecError::MalformedTag {
                line: line_no,
                tag: part.to_string(),
            });
        };
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        tags.push((key.trim().to_string(), value.to_string()));
    }
    Ok(tags)
}

/// Serializes the graph using the forward-reference-free ordering.
pub fn to_text(graph: &Graph) -> String {
    let mut ids: Vec<NodeId> = graph.nodes().map(|n| n.id()).collect();
    ids.sort_by(|&a, &b| {
        let (na, nb) = match (graph.node(a), graph.node(b)) {
            (Some(na), Some(nb)) => (na, nb),
            _ => return std::cmp::Ordering::Equal,
        };
        nb.export_depth
            .cmp(&na.export_depth)
            .then_with(|| export_weight(graph, a).cmp(&export_weight(graph, b)))
    });

    let mut out = String::from("type\t|\tid\t|\tsrc\t|\ttgt\t|\ttags\n");
    for id in ids {
        if let Some(node) = graph.node(id) {
            let kind = match node.kind {
                NodeKind::Dot => "dot",
                NodeKind::Link => "link",
                NodeKind::Label => "label",
            };
            let src = node.source.unwrap_or(0);
            let tgt = node.target.unwrap_or(0);
            let tags: Vec<String> = node
                .tags()
                .map(|(k, v)| format!("{k}: \"{v}\""))
                .collect();
            out.push_str(&format!(
                "{kind}\t|\t{id}\t|\t{src}\t|\t{tgt}\t|\t{tags}\n",
                tags = tags.join("; ")
            ));
        }
    }
    out
}

pub fn save(graph: &Graph, path: impl AsRef<Path>) -> Result<(), CodecError> {
    fs::write(path.as_ref(), to_text(graph))?;
    info!("saved {} node(s) to {}", graph.len(), path.as_ref().display());
    Ok(())
}

/// Recursive serialization weight. An entity with no references weighs 1;
/// otherwise each referenced side contributes its own weight times its id,
/// which strictly exceeds every weight it depends on.
fn export_weight(graph: &Graph, id: NodeId) -> u64 {
    let Some(node) = graph.node(id) else {
        return 1;
    };
    if node.source.is_none() && node.target.is_none() {
        return 1;
    }
    let mut weight = 1u64;
    if let Some(s) = node.source {
        weight = weight
            .saturating_mul(export_weight(graph, s))
            .saturating_mul(s as u64);
    }
    if let Some(t) = node.target {
        weight = weight
            .saturating_mul(export_weight(graph, t))
            .saturating_mul(t as u64);
    }
    weight
}

/// Rebuilds a live graph from parsed lines. Source and target ids resolve
/// against already-materialized entities only, which a file produced by
/// [`to_text`] guarantees. Labels must carry a source; that requirement is
/// what makes a detached label unrepresentable.
pub fn build_graph(data: &GraphData) -> Result<Graph, CodecError> {
    let mut graph = Graph::new();

    for line in &data.lines {
        let origin = position_of(line);
        let (can_connect, can_delete, depth, export_depth) = match line.kind {
            NodeKind::Dot => (true, true, 1, 2),
            NodeKind::Link => (true, true, 1, 1),
            NodeKind::Label => (false, false, 0, 0),
        };

        let mut node = Graph::make_node(line.kind, line.id, origin, can_connect, can_delete);
        node.depth = depth;
        node.export_depth = export_depth;

        match line.kind {
            NodeKind::Dot => {}
            NodeKind::Link => {
                node.source = resolve(&graph, line, line.source_id)?;
                node.target = resolve(&graph, line, line.target_id)?;
                node.both_ways = line.tag("BothWays").is_some();
            }
            NodeKind::Label => {
                let source = resolve(&graph, line, line.source_id)?;
                let Some(source) = source else {
                    return Err(CodecError::DanglingReference {
                        id: line.id,
                        referenced: line.source_id,
                    });
                };
                node.source = Some(source);
            }
        }

        let id = graph.insert_raw(node);
        for (key, value) in &line.tags {
            graph.set_tag_silent(id, key, value);
        }

        match line.kind {
            NodeKind::Dot => graph.bump_dot_tag(),
            NodeKind::Link => {
                if let Some(graph_node) = graph.node(id) {
                    let (src, tgt) = (graph_node.source, graph_node.target);
                    if let Some(s) = src {
                        graph.register_link_follow(s, id);
                    }
                    if let Some(t) = tgt {
                        graph.register_link_follow(t, id);
                    }
                }
            }
            NodeKind::Label => {
                if let Some(source) = graph.node(id).and_then(|n| n.source) {
                    graph.register_label_bridge(id, source);
                }
            }
        }
    }

    Ok(graph)
}

fn resolve(graph: &Graph, line: &GraphLine, referenced: u32) -> Result<Option<NodeId>, CodecError> {
    if referenced == 0 {
        return Ok(None);
    }
    if graph.node(referenced).is_none() {
        return Err(CodecError::DanglingReference {
            id: line.id,
            referenced,
        });
    }
    Ok(Some(referenced))
}

fn position_of(line: &GraphLine) -> Vec2 {
    let Some(text) = line.tag("Position") else {
        return Vec2::ZERO;
    };
    let Some((x, y)) = text.split_once(',') else {
        return Vec2::ZERO;
    };
    match (x.trim().parse(), y.trim().parse()) {
        (Ok(x), Ok(y)) => Vec2::new(x, y),
        _ => Vec2::ZERO,
    }
}
