//! Unit tests for the adjacency view.

use crate::codec::GraphData;
use crate::digraph::Digraph;

fn view(text: &str) -> Digraph {
    Digraph::from_data(&GraphData::parse(text).unwrap())
}

const CHAIN: &str = "header\n\
    dot\t|\t1\t|\t0\t|\t0\t|\tLabel: \"a\"\n\
    dot\t|\t2\t|\t0\t|\t0\t|\tLabel: \"b\"\n\
    dot\t|\t3\t|\t0\t|\t0\t|\tLabel: \"c\"\n\
    link\t|\t4\t|\t1\t|\t2\t|\tLabel: \"go\"\n\
    link\t|\t5\t|\t2\t|\t3\t|\tLabel: \"back\"; BothWays: \"true\"\n\
    label\t|\t6\t|\t1\t|\t0\t|\tLabel: \"a\"\n";

#[test]
fn sorts_entities_into_dots_and_links() {
    let digraph = view(CHAIN);
    assert_eq!(digraph.dots.len(), 3);
    assert_eq!(digraph.links.len(), 2);
    assert!(digraph.dots.contains(2));
    assert!(digraph.links.contains(4));
    assert!(!digraph.dots.contains(4));
}

#[test]
fn degrees_count_distinct_neighbors() {
    let digraph = view(CHAIN);

    assert_eq!(digraph.out_degree(1), 1);
    assert_eq!(digraph.in_degree(1), 0);

    // the bidirectional link to 3 counts on both sides of dot 2
    assert_eq!(digraph.out_degree(2), 1);
    assert_eq!(digraph.in_degree(2), 2);

    assert_eq!(digraph.out_degree(3), 1);
    assert_eq!(digraph.in_degree(3), 1);
}

#[test]
fn neighborhoods_carry_the_link_descriptor() {
    let digraph = view(CHAIN);

    let out: Vec<(u32, &str)> = digraph
        .edges_out(1)
        .map(|(to, link)| (to, link.label.as_str()))
        .collect();
    assert_eq!(out, vec![(2, "go")]);

    let back: Vec<u32> = digraph.edges_out(3).map(|(to, _)| to).collect();
    assert_eq!(back, vec![2]);
}

#[test]
fn dots_are_identities_and_links_are_relations() {
    let digraph = view(CHAIN);
    assert!(digraph.node(1).unwrap().is_identity());
    assert!(!digraph.node(1).unwrap().is_relation());

    let link = digraph.node(4).unwrap();
    assert!(link.is_relation());
    assert!(!link.is_identity());
    assert!(!link.bidirectional);
    assert!(digraph.node(5).unwrap().bidirectional);
}

#[test]
fn scan_stops_at_the_first_label_row() {
    // structural rows below a label row are ignored
    let text = "header\n\
        dot\t|\t1\t|\t0\t|\t0\t|\tLabel: \"a\"\n\
        label\t|\t2\t|\t1\t|\t0\t|\tLabel: \"a\"\n\
        dot\t|\t3\t|\t0\t|\t0\t|\tLabel: \"late\"\n";
    let digraph = view(text);
    assert_eq!(digraph.dots.len(), 1);
    assert!(digraph.node(3).is_none());
}

#[test]
fn empty_data_yields_an_empty_view() {
    let digraph = view("header\n");
    assert_eq!(digraph.dots.len(), 0);
    assert_eq!(digraph.links.len(), 0);
    assert_eq!(digraph.out_degree(1), 0);
}
