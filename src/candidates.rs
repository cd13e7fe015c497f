//! Service candidates derived from a flat community assignment.
//!
//! One candidate per distinct community identifier. A member belongs to the
//! candidate's interface when some vertex outside the community calls it.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::graph::{class_of, CallGraph};

/// A group of vertices proposed as one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceCandidate {
    /// Community identifier, itself one of the members.
    pub id: String,
    /// Member identities, sorted.
    pub members: Vec<String>,
    /// Members invoked from outside the community, sorted.
    pub interface: Vec<String>,
    /// Distinct class prefixes of the members, sorted.
    pub classes: Vec<String>,
}

impl ServiceCandidate {
    /// Whether the candidate spans more than one class.
    pub fn crosses_classes(&self) -> bool {
        self.classes.len() > 1
    }
}

/// Group `assignment` (vertex → community, e.g. [`crate::community::Detection::assignment`])
/// into candidates ordered by community identifier.
///
/// Vertices of `assignment` missing from `graph` still become members but
/// contribute no interface entries.
pub fn derive_candidates(
    graph: &CallGraph,
    assignment: &BTreeMap<String, String>,
) -> Vec<ServiceCandidate> {
    let mut members: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (vertex, community) in assignment {
        members.entry(community.as_str()).or_default().push(vertex.as_str());
    }

    let mut interface: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for (source, target, _) in graph.edges() {
        let (caller, callee) = (graph.name(source), graph.name(target));
        let (Some(from), Some(to)) = (assignment.get(caller), assignment.get(callee)) else {
            continue;
        };
        if from != to {
            interface.entry(to.as_str()).or_default().insert(callee);
        }
    }

    members
        .into_iter()
        .map(|(id, members)| ServiceCandidate {
            id: id.to_string(),
            classes: members
                .iter()
                .map(|m| class_of(m))
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(str::to_string)
                .collect(),
            interface: interface
                .remove(id)
                .unwrap_or_default()
                .into_iter()
                .map(str::to_string)
                .collect(),
            members: members.into_iter().map(str::to_string).collect(),
        })
        .collect()
}
