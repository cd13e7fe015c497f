//! Local moving phase.
//!
//! Sweeps over all vertices in graph order. Each vertex is evaluated against
//! every distinct community among its neighbours plus its own, using the gain
//! from [`super::modularity`]. The best candidate wins, ties going to the
//! community whose identifier sorts first; the vertex moves only when that
//! candidate beats staying by a strictly positive margin.
//!
//! Sweeps repeat until one completes without a move, or until the sweep
//! ceiling is hit.

use tracing::trace;

use crate::graph::{CallGraph, VertexId};

use super::modularity::{scaled_gain, unscale};
use super::CommunityAssignment;

/// Result of one optimizer pass.
#[derive(Debug, Clone)]
pub struct LocalMoving {
    /// Assignment after the last sweep.
    pub assignment: CommunityAssignment,
    /// At least one vertex changed community.
    pub improved: bool,
    /// Total number of accepted moves.
    pub moves: usize,
    /// Sweeps performed.
    pub sweeps: usize,
    /// The last sweep made no move (a local optimum was reached).
    pub converged: bool,
    /// Modularity gained over the starting assignment.
    pub modularity_gain: f64,
}

/// Run local moving from `assignment` on `graph` for at most `max_sweeps`
/// full sweeps.
pub fn optimize(
    graph: &CallGraph,
    assignment: CommunityAssignment,
    max_sweeps: usize,
) -> LocalMoving {
    let m = graph.total_weight();
    if m == 0 {
        return LocalMoving {
            assignment,
            improved: false,
            moves: 0,
            sweeps: 0,
            converged: true,
            modularity_gain: 0.0,
        };
    }

    let two_m = 2 * i128::from(m);
    let mut sigma = assignment.community_degrees(graph);
    let mut labels = assignment.into_labels();
    let mut scratch = NeighbourCommunities::new(graph.vertex_count());

    let mut moves = 0;
    let mut sweeps = 0;
    let mut converged = false;
    let mut total_gain: i128 = 0;

    while sweeps < max_sweeps {
        sweeps += 1;
        let mut moved_this_sweep = 0;

        for vertex in graph.vertices() {
            let current = labels[vertex.index()];
            let degree = graph.degree(vertex);
            sigma[current.index()] -= degree;

            scratch.collect(graph, vertex, current, &labels);
            let gain_of = |community: VertexId, weight_to: u64| {
                scaled_gain(two_m, weight_to, degree, sigma[community.index()])
            };

            let stay = gain_of(current, scratch.weight_to(current));
            let (mut best, mut best_gain) = (current, stay);
            for (community, weight_to) in scratch.candidates() {
                let gain = gain_of(community, weight_to);
                if gain > best_gain
                    || (gain == best_gain && graph.rank(community) < graph.rank(best))
                {
                    best = community;
                    best_gain = gain;
                }
            }

            let target = if best_gain > stay { best } else { current };
            sigma[target.index()] += degree;
            if target != current {
                trace!(
                    vertex = graph.name(vertex),
                    from = graph.name(current),
                    to = graph.name(target),
                    "moved vertex"
                );
                labels[vertex.index()] = target;
                total_gain += best_gain - stay;
                moved_this_sweep += 1;
            }
            scratch.clear();
        }

        moves += moved_this_sweep;
        if moved_this_sweep == 0 {
            converged = true;
            break;
        }
    }

    LocalMoving {
        assignment: CommunityAssignment::from_labels_unchecked(labels),
        improved: moves > 0,
        moves,
        sweeps,
        converged,
        modularity_gain: unscale(total_gain, m),
    }
}

/// Whether no vertex of `graph` has a strictly improving move under
/// `assignment`, i.e. running [`optimize`] would leave it unchanged.
pub fn is_local_optimum(graph: &CallGraph, assignment: &CommunityAssignment) -> bool {
    !optimize(graph, assignment.clone(), 1).improved
}

/// Reusable buffer of `e(v,D)` per neighbouring community.
struct NeighbourCommunities {
    weight: Vec<u64>,
    seen: Vec<bool>,
    touched: Vec<VertexId>,
}

impl NeighbourCommunities {
    fn new(n: usize) -> Self {
        Self {
            weight: vec![0; n],
            seen: vec![false; n],
            touched: Vec::new(),
        }
    }

    /// Gather the communities adjacent to `vertex`, always including `current`.
    fn collect(
        &mut self,
        graph: &CallGraph,
        vertex: VertexId,
        current: VertexId,
        labels: &[VertexId],
    ) {
        self.touch(current);
        for &(neighbour, w) in graph.incident(vertex) {
            let community = labels[neighbour.index()];
            self.touch(community);
            self.weight[community.index()] += w;
        }
    }

    fn touch(&mut self, community: VertexId) {
        if !self.seen[community.index()] {
            self.seen[community.index()] = true;
            self.touched.push(community);
        }
    }

    fn weight_to(&self, community: VertexId) -> u64 {
        self.weight[community.index()]
    }

    fn candidates(&self) -> impl Iterator<Item = (VertexId, u64)> + '_ {
        self.touched.iter().map(|&c| (c, self.weight[c.index()]))
    }

    fn clear(&mut self) {
        for &community in &self.touched {
            self.weight[community.index()] = 0;
            self.seen[community.index()] = false;
        }
        self.touched.clear();
    }
}
