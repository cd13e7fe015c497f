//! Graph aggregation.
//!
//! Collapses every community into one super-vertex named after the community
//! identifier. An edge `(u, v, w)` contributes `w` to the super-edge
//! `(C(u), C(v))`; when both endpoints share a community that super-edge is a
//! self-loop. Self-loops are kept so that community degrees, and with them
//! modularity, carry over to the coarser level unchanged. Total weight is
//! preserved exactly.

use std::collections::BTreeMap;

use crate::errors::{Error, Result};
use crate::graph::{CallGraph, VertexId};

use super::CommunityAssignment;

/// A coarsened graph plus the vertex correspondences needed to expand it.
#[derive(Debug, Clone)]
pub struct Aggregation {
    /// The coarser graph.
    pub graph: CallGraph,
    /// `projection[v]` is the super-vertex that vertex `v` collapsed into.
    pub projection: Vec<VertexId>,
    /// `origin[s]` is the community identifier (a vertex of the finer graph)
    /// that super-vertex `s` stands for.
    pub origin: Vec<VertexId>,
}

/// Build the next graph level from `graph` partitioned by `assignment`.
pub fn aggregate(graph: &CallGraph, assignment: &CommunityAssignment) -> Result<Aggregation> {
    if assignment.len() != graph.vertex_count() {
        return Err(Error::IncompleteAssignment {
            missing: graph.vertex_count().saturating_sub(assignment.len()),
            stale: assignment.len().saturating_sub(graph.vertex_count()),
            sample: Vec::new(),
        });
    }
    Ok(aggregate_unchecked(graph, assignment))
}

/// [`aggregate`] for assignments produced by this crate for this graph.
pub(crate) fn aggregate_unchecked(
    graph: &CallGraph,
    assignment: &CommunityAssignment,
) -> Aggregation {
    // Super-vertices are numbered by the first appearance of their community.
    let mut super_of: Vec<Option<VertexId>> = vec![None; graph.vertex_count()];
    let mut origin = Vec::new();
    let mut names = Vec::new();

    let projection: Vec<VertexId> = graph
        .vertices()
        .map(|vertex| {
            let community = assignment.community_of(vertex);
            *super_of[community.index()].get_or_insert_with(|| {
                origin.push(community);
                names.push(graph.name(community).to_string());
                VertexId::new(origin.len() - 1)
            })
        })
        .collect();

    let mut edges: BTreeMap<(VertexId, VertexId), u64> = BTreeMap::new();
    for (source, target, weight) in graph.edges() {
        let key = (projection[source.index()], projection[target.index()]);
        *edges.entry(key).or_insert(0) += weight;
    }

    Aggregation {
        graph: CallGraph::from_parts(names, edges),
        projection,
        origin,
    }
}
