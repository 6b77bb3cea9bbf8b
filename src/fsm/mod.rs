//! Runtime automaton compiled from diagram data.
//!
//! Dots become states named by their "Label" tag; a label wrapped in
//! brackets (`[start]`) additionally marks the entry state. Links become
//! transitions keyed by their label, registered in both directions when
//! the link is tagged `BothWays`. This interprets the *data* of a diagram,
//! independent of any editor concern.

use std::collections::{BTreeSet, HashMap};

use log::debug;
use serde::Serialize;

use crate::codec::GraphData;
use crate::graph::NodeKind;


/// State name used for dots with no "Label" tag.
const UNNAMED_STATE: &str = "empty";
/// Transition token used for links with no "Label" tag.
const WILDCARD_TOKEN: &str = "*";

/// Result of one [`Machine::trigger`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The current state had a transition for the token.
    Moved {
        from: String,
        token: String,
        to: String,
    },
    /// No transition matched; the state is unchanged. Expected at
    /// runtime, not an error.
    Rejected { from: String, token: String },
}

impl TriggerOutcome {
    pub fn moved(&self) -> bool {
        matches!(self, TriggerOutcome::Moved { .. })
    }
}

/// An executable finite-state machine.
#[derive(Debug, Clone, Serialize)]
pub struct Machine {
    states: BTreeSet<String>,
    /// Dot id to state name, used while resolving link endpoints.
    index: HashMap<u32, String>,
    transitions: HashMap<String, HashMap<String, String>>,
    current: String,
}

impl Machine {
    /// Compiles parsed diagram data. The first bracket-labelled dot
    /// becomes the initial current state; without one the machine starts
    /// in a nameless state that accepts nothing.
    pub fn compile(data: &GraphData) -> Self {
        let mut machine = Self {
            states: BTreeSet::new(),
            index: HashMap::new(),
            transitions: HashMap::new(),
            current: String::new(),
        };

        for line in &data.lines {
            match line.kind {
                NodeKind::Dot => {
                    let raw = line.tag_or("Label", UNNAMED_STATE);
                    let label = match raw.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                        Some(entry) => {
                            if machine.current.is_empty() {
                                machine.current = entry.to_string();
                            }
                            entry
                        }
                        None => raw,
                    };

                    machine.states.insert(label.to_string());
                    machine
                        .index
                        .entry(line.id)
                        .or_insert_with(|| label.to_string());
                    machine.transitions.entry(label.to_string()).or_default();
                }
                NodeKind::Link => {
                    let token = line.tag_or("Label", WILDCARD_TOKEN).to_string();
                    let src = machine.index.get(&line.source_id).cloned();
                    let tgt = machine.index.get(&line.target_id).cloned();
                    let (Some(src), Some(tgt)) = (src, tgt) else {
                        debug!(
                            "link {} skipped: endpoint {} or {} is not a state",
                            line.id, line.source_id, line.target_id
                        );
                        continue;
                    };

                    machine
                        .transitions
                        .entry(src.clone())
                        .or_default()
                        .insert(token.clone(), tgt.clone());
                    if line.tag("BothWays").is_some() {
                        machine.transitions.entry(tgt).or_default().insert(token, src);
                    }
                }
                NodeKind::Label => {}
            }
        }

        machine
    }

    pub fn current_state(&self) -> &str {
        &self.current
    }

    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(String::as_str)
    }

    /// Registered transitions out of `state`, as (token, target) pairs.
    pub fn transitions_from(&self, state: &str) -> impl Iterator<Item = (&str, &str)> {
        self.transitions
            .get(state)
            .into_iter()
            .flatten()
            .map(|(token, target)| (token.as_str(), target.as_str()))
    }

    /// Takes the transition for `token` if the current state has one.
    pub fn trigger(&mut self, token: &str) -> TriggerOutcome {
        let target = self
            .transitions
            .get(&self.current)
            .and_then(|table| table.get(token))
            .cloned();

        match target {
            Some(to) => {
                let from = std::mem::replace(&mut self.current, to.clone());
                debug!("{from} -[{token}]-> {to}");
                TriggerOutcome::Moved {
                    from,
                    token: token.to_string(),
                    to,
                }
            }
            None => {
                debug!("{} -[{token}]-> (rejected)", self.current);
                TriggerOutcome::Rejected {
                    from: self.current.clone(),
                    token: token.to_string(),
                }
            }
        }
    }
}
