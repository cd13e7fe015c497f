//! Connectivity refinement.
//!
//! Local moving places a vertex by edge weight alone, so a community can end
//! up with members that no path inside the community reaches. Refinement
//! splits every community into the connected components of its induced
//! subgraph (edge direction ignored). It never merges.
//!
//! Each resulting community is labelled by its member whose identity sorts
//! first, so the output does not depend on vertex enumeration order.

use std::collections::VecDeque;

use crate::graph::{CallGraph, VertexId};

use super::CommunityAssignment;

/// Split every community of `assignment` into its internally connected parts.
pub fn refine(graph: &CallGraph, assignment: &CommunityAssignment) -> CommunityAssignment {
    let n = graph.vertex_count();
    let mut refined: Vec<Option<VertexId>> = vec![None; n];
    let mut queue = VecDeque::new();
    let mut component = Vec::new();

    for start in graph.vertices() {
        if refined[start.index()].is_some() {
            continue;
        }
        let community = assignment.community_of(start);

        // Placeholder label marks vertices as visited during the walk.
        refined[start.index()] = Some(start);
        queue.push_back(start);
        while let Some(vertex) = queue.pop_front() {
            component.push(vertex);
            for &(neighbour, _) in graph.incident(vertex) {
                if refined[neighbour.index()].is_none()
                    && assignment.community_of(neighbour) == community
                {
                    refined[neighbour.index()] = Some(start);
                    queue.push_back(neighbour);
                }
            }
        }

        let representative = component
            .iter()
            .copied()
            .fold(start, |rep, v| graph.lowest(rep, v));
        for vertex in component.drain(..) {
            refined[vertex.index()] = Some(representative);
        }
    }

    CommunityAssignment::from_labels_unchecked(
        refined
            .into_iter()
            .zip(graph.vertices())
            .map(|(label, vertex)| label.unwrap_or(vertex))
            .collect(),
    )
}

/// Whether every community of `assignment` is internally connected.
pub fn is_connected_partition(graph: &CallGraph, assignment: &CommunityAssignment) -> bool {
    refine(graph, assignment).community_count() == assignment.community_count()
}
