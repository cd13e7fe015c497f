//! Modularity of a partition and the exact local-move gain.
//!
//! With `m` the total edge weight, `L_C` the weight of edges with both
//! endpoints in community `C` (self-loops included) and `Σ_C` the summed
//! out+in degree of its members:
//!
//! ```text
//! Q = Σ_C [ L_C / m − (Σ_C / 2m)² ]
//! ```
//!
//! Moving a vertex `v` (degree `k_v`) into community `D` gains
//!
//! ```text
//! ΔQ(v→D) = e(v,D) / m − k_v · Σ_D / (2m²)
//! ```
//!
//! where `e(v,D)` is the weight between `v` and the members of `D` in either
//! direction and `Σ_D` excludes `v` itself. Multiplying through by `2m²` keeps
//! every quantity integral, so gains are compared exactly.

use crate::graph::CallGraph;

use super::CommunityAssignment;

/// Modularity `Q` of `assignment` on `graph`; zero for an edgeless graph.
pub fn modularity(graph: &CallGraph, assignment: &CommunityAssignment) -> f64 {
    let m = graph.total_weight() as f64;
    if m == 0.0 {
        return 0.0;
    }

    let internal: u64 = graph
        .edges()
        .filter(|&(u, v, _)| assignment.community_of(u) == assignment.community_of(v))
        .map(|(_, _, w)| w)
        .sum();

    let spread: f64 = assignment
        .community_degrees(graph)
        .into_iter()
        .filter(|&sigma| sigma > 0)
        .map(|sigma| {
            let share = sigma as f64 / (2.0 * m);
            share * share
        })
        .sum();

    internal as f64 / m - spread
}

/// `ΔQ(v→D) · 2m²` as an exact integer.
///
/// `two_m` is `2m`, `weight_to` is `e(v,D)`, `degree` is `k_v` and
/// `community_degree` is `Σ_D` without `v`. With `m` at most
/// [`MAX_TOTAL_WEIGHT`](crate::graph::MAX_TOTAL_WEIGHT) both products stay below `2^127`.
#[inline]
pub(crate) fn scaled_gain(
    two_m: i128,
    weight_to: u64,
    degree: u64,
    community_degree: u64,
) -> i128 {
    two_m * i128::from(weight_to) - i128::from(degree) * i128::from(community_degree)
}

/// Convert a scaled gain back to a modularity difference.
pub(crate) fn unscale(gain: i128, total_weight: u64) -> f64 {
    let m = total_weight as f64;
    gain as f64 / (2.0 * m * m)
}
