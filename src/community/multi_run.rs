//! Re-detection from a previous run's output.
//!
//! The prior assignment is collapsed with the ordinary aggregation rule and
//! a fresh detector runs over the coarse graph. Its result is composed with
//! the prior so the output is keyed by the original vertices again.

use std::collections::BTreeMap;

use tracing::debug;

use crate::errors::Result;
use crate::graph::{CallGraph, VertexId};

use super::{aggregate, modularity, CommunityAssignment, Detection, HierarchicalDetector};

/// Continue coarsening `graph` from `prior`, a vertex → community map such as
/// [`Detection::assignment`] from an earlier run.
///
/// Prior communities are relabelled to their lowest-named member first, so
/// any vertex may serve as an identifier in `prior`. Fails if `prior` does
/// not cover exactly the vertices of `graph`, or names a community that is
/// not a vertex.
pub fn redetect(
    graph: &CallGraph,
    prior: &BTreeMap<String, String>,
    detector: &HierarchicalDetector,
) -> Result<Detection> {
    let prior = CommunityAssignment::from_names(graph, prior)?.canonicalize(graph);
    let coarse = aggregate(graph, &prior)?;
    debug!(
        vertices = graph.vertex_count(),
        prior_communities = coarse.graph.vertex_count(),
        "Re-detecting from prior assignment"
    );

    let (hierarchy, warnings) = detector.build_hierarchy(&coarse.graph);
    let coarse_flat = hierarchy.flatten();

    let labels: Vec<VertexId> = graph
        .vertices()
        .map(|vertex| {
            let super_vertex = coarse.projection[vertex.index()];
            coarse.origin[coarse_flat.community_of(super_vertex).index()]
        })
        .collect();
    let flat = CommunityAssignment::from_labels_unchecked(labels);

    Ok(Detection {
        assignment: flat.to_names(graph),
        levels: hierarchy.levels().len(),
        modularity: modularity(graph, &flat),
        warnings,
    })
}
