//! Ingestion of call observations into a [`CallGraph`].
//!
//! The builder works in one of two modes:
//!
//! - **open** ([`CallGraphBuilder::new`]): every caller and callee becomes a vertex.
//! - **closed** ([`CallGraphBuilder::closed`]): only declared identities are
//!   vertices; observations that mention anything else are dropped. This is
//!   how calls into framework or library code that was never parsed are kept
//!   out of the graph.
//!
//! Identities pass through the configured [`Granularity`] before interning.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::errors::{Error, Result};

use super::{CallGraph, Granularity, VertexId, MAX_TOTAL_WEIGHT};

/// One observed call relationship as produced by a call-graph extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallObservation {
    pub caller: String,
    pub callee: String,
    pub count: i64,
}

impl CallObservation {
    pub fn new(caller: impl Into<String>, callee: impl Into<String>, count: i64) -> Self {
        Self {
            caller: caller.into(),
            callee: callee.into(),
            count,
        }
    }
}

/// Observations discarded during ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DroppedObservations {
    /// Count was zero or negative.
    pub non_positive: usize,
    /// An endpoint was never declared (closed mode only).
    pub dangling: usize,
}

/// Accumulates observations and interns identities.
#[derive(Debug, Clone, Default)]
pub struct CallGraphBuilder {
    granularity: Granularity,
    closed: bool,
    names: Vec<String>,
    index: HashMap<String, VertexId>,
    pending: Vec<(String, String, u64)>,
    dropped: DroppedObservations,
}

impl CallGraphBuilder {
    /// Open builder: endpoints of observations become vertices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Closed builder: only declared identities become vertices.
    pub fn closed() -> Self {
        Self {
            closed: true,
            ..Self::default()
        }
    }

    /// Resolve identities at the given granularity.
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Add a vertex, even if it never takes part in a call.
    pub fn declare(&mut self, identity: &str) -> &mut Self {
        let resolved = self.granularity.resolve(identity).to_string();
        self.intern(resolved);
        self
    }

    /// Record `count` calls from `caller` to `callee`.
    pub fn observe(
        &mut self,
        caller: impl AsRef<str>,
        callee: impl AsRef<str>,
        count: i64,
    ) -> &mut Self {
        let (caller, callee) = (caller.as_ref(), callee.as_ref());
        if count <= 0 {
            trace!(caller, callee, count, "dropping non-positive observation");
            self.dropped.non_positive += 1;
            return self;
        }

        let caller = self.granularity.resolve(caller).to_string();
        let callee = self.granularity.resolve(callee).to_string();

        if !self.closed {
            self.intern(caller.clone());
            self.intern(callee.clone());
        }
        self.pending.push((caller, callee, count as u64));
        self
    }

    /// Record a batch of observations.
    pub fn observe_all<I>(&mut self, observations: I) -> &mut Self
    where
        I: IntoIterator<Item = CallObservation>,
    {
        for obs in observations {
            self.observe(&obs.caller, &obs.callee, obs.count);
        }
        self
    }

    /// Observations discarded so far, counting those whose endpoints are not
    /// (yet) declared as dangling.
    pub fn dropped(&self) -> DroppedObservations {
        let mut dropped = self.dropped;
        dropped.dangling += self
            .pending
            .iter()
            .filter(|(caller, callee, _)| {
                !self.index.contains_key(caller) || !self.index.contains_key(callee)
            })
            .count();
        dropped
    }

    /// Finish ingestion.
    ///
    /// Fails with [`Error::WeightOverflow`] when the kept observations add up
    /// to more than [`MAX_TOTAL_WEIGHT`].
    pub fn build(self) -> Result<CallGraph> {
        let dropped = self.dropped();
        let mut edges: BTreeMap<(VertexId, VertexId), u64> = BTreeMap::new();
        let mut total = 0u64;

        for (caller, callee, weight) in &self.pending {
            match (self.index.get(caller), self.index.get(callee)) {
                (Some(&source), Some(&target)) => {
                    total = total
                        .checked_add(*weight)
                        .filter(|&sum| sum <= MAX_TOTAL_WEIGHT)
                        .ok_or(Error::WeightOverflow {
                            limit: MAX_TOTAL_WEIGHT,
                        })?;
                    // Bounded by `total`.
                    *edges.entry((source, target)).or_insert(0) += weight;
                }
                _ => trace!(%caller, %callee, "dropping observation with undeclared endpoint"),
            }
        }

        debug!(
            vertices = self.names.len(),
            edges = edges.len(),
            dropped_non_positive = dropped.non_positive,
            dropped_dangling = dropped.dangling,
            granularity = ?self.granularity,
            "built call graph"
        );

        Ok(CallGraph::from_parts(self.names, edges))
    }

    fn intern(&mut self, name: String) -> VertexId {
        if let Some(&id) = self.index.get(&name) {
            return id;
        }
        let id = VertexId::new(self.names.len());
        self.names.push(name.clone());
        self.index.insert(name, id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_builder_interns_in_first_seen_order() {
        let mut builder = CallGraphBuilder::new();
        builder.observe("B.go", "A.go", 1).observe("C.go", "B.go", 1);
        let graph = builder.build().unwrap();

        let names: Vec<&str> = graph.vertices().map(|v| graph.name(v)).collect();
        assert_eq!(names, vec!["B.go", "A.go", "C.go"]);
    }

    #[test]
    fn test_closed_builder_drops_dangling_observations() {
        let mut builder = CallGraphBuilder::closed();
        builder
            .declare("UserService.Create")
            .declare("Validator.Check")
            .observe("UserService.Create", "Validator.Check", 2)
            .observe("UserService.Create", "Console.WriteLine", 5);

        assert_eq!(builder.dropped().dangling, 1);
        let graph = builder.build().unwrap();

        assert_eq!(graph.vertex_count(), 2);
        assert!(!graph.contains("Console.WriteLine"));
        assert_eq!(graph.total_weight(), 2);
    }

    #[test]
    fn test_declared_vertex_without_calls_is_kept() {
        let mut builder = CallGraphBuilder::new();
        builder.declare("Lonely.method");
        let graph = builder.build().unwrap();

        assert_eq!(graph.vertex_count(), 1);
        assert_eq!(graph.total_weight(), 0);
    }

    #[test]
    fn test_non_positive_counts_are_counted_as_dropped() {
        let mut builder = CallGraphBuilder::new();
        builder.observe("a", "b", 0).observe("a", "b", -1).observe("a", "b", 1);

        assert_eq!(builder.dropped().non_positive, 2);
        assert_eq!(builder.build().unwrap().total_weight(), 1);
    }

    #[test]
    fn test_class_granularity_folds_methods() {
        let mut builder = CallGraphBuilder::new().with_granularity(Granularity::Class);
        builder
            .observe("Orders.place", "Orders.validate", 2)
            .observe("Orders.place", "Billing.charge", 1);
        let graph = builder.build().unwrap();

        let orders = graph.id_of("Orders").unwrap();
        assert_eq!(graph.vertex_count(), 2);
        assert_eq!(graph.self_loop(orders), 2);
        assert_eq!(graph.total_weight(), 3);
    }

    #[test]
    fn test_repeated_huge_counts_are_rejected() {
        let mut builder = CallGraphBuilder::new();
        builder
            .observe("a", "b", i64::MAX)
            .observe("a", "b", i64::MAX)
            .observe("a", "b", i64::MAX);

        assert!(matches!(
            builder.build(),
            Err(Error::WeightOverflow { limit }) if limit == MAX_TOTAL_WEIGHT
        ));
    }

    #[test]
    fn test_opposing_huge_counts_are_rejected() {
        let mut builder = CallGraphBuilder::new();
        builder.observe("a", "b", i64::MAX).observe("b", "a", i64::MAX);
        assert!(matches!(builder.build(), Err(Error::WeightOverflow { .. })));
    }

    #[test]
    fn test_total_weight_at_limit_is_accepted() {
        let half = (MAX_TOTAL_WEIGHT / 2) as i64;
        let mut builder = CallGraphBuilder::new();
        builder.observe("a", "b", half).observe("b", "a", half);
        let graph = builder.build().unwrap();

        assert_eq!(graph.total_weight(), MAX_TOTAL_WEIGHT);
        assert_eq!(graph.degree(graph.id_of("a").unwrap()), MAX_TOTAL_WEIGHT);
    }

    #[test]
    fn test_calls_to_undeclared_vertices_do_not_count_towards_limit() {
        let mut builder = CallGraphBuilder::closed();
        builder
            .declare("a")
            .declare("b")
            .observe("a", "b", 1)
            .observe("a", "external", i64::MAX)
            .observe("a", "external", i64::MAX);
        assert_eq!(builder.build().unwrap().total_weight(), 1);
    }
}
