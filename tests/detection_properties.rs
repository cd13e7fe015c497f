//! Property-based tests for community detection
//!
//! These tests verify invariants that should hold for all call graphs:
//! - The final assignment covers exactly the input vertices
//! - Every community identifier is one of its own members
//! - Aggregation never creates or loses weight
//! - Refinement only splits, and only as far as connectivity requires
//! - Local moving never decreases modularity, and every sweep that moves a
//!   vertex strictly increases it
//! - Detection is deterministic and idempotent on its own output

use proptest::prelude::*;
use servicemap::community::{
    aggregate, is_connected_partition, is_local_optimum, modularity, optimize, redetect, refine,
    CommunityAssignment, HierarchicalDetector,
};
use servicemap::graph::{CallGraph, CallObservation, VertexId};
use std::collections::BTreeSet;

/// Random call graph over at most 12 vertices named `m00`..`m11`
fn call_graph() -> impl Strategy<Value = CallGraph> {
    prop::collection::vec((0usize..12, 0usize..12, 1i64..6), 0..40).prop_map(|edges| {
        let observations = edges.into_iter().map(|(caller, callee, count)| {
            CallObservation::new(format!("m{caller:02}"), format!("m{callee:02}"), count)
        });
        CallGraph::from_observations(observations).unwrap()
    })
}

/// A graph together with an arbitrary (not necessarily sensible) assignment
fn graph_with_assignment() -> impl Strategy<Value = (CallGraph, CommunityAssignment)> {
    call_graph()
        .prop_filter("needs vertices", |graph| !graph.is_empty())
        .prop_flat_map(|graph| {
            let n = graph.vertex_count();
            (Just(graph), prop::collection::vec(0..n, n))
        })
        .prop_map(|(graph, picks)| {
            let vertices: Vec<VertexId> = graph.vertices().collect();
            let labels = picks.into_iter().map(|i| vertices[i]).collect();
            let assignment = CommunityAssignment::from_labels(&graph, labels).unwrap();
            (graph, assignment)
        })
}

fn names(graph: &CallGraph) -> BTreeSet<String> {
    graph.vertices().map(|v| graph.name(v).to_string()).collect()
}

proptest! {
    /// Property: the result is keyed by exactly the input vertices
    #[test]
    fn prop_assignment_covers_every_vertex(graph in call_graph()) {
        let detection = HierarchicalDetector::default().detect(&graph);
        let keys: BTreeSet<String> = detection.assignment.keys().cloned().collect();
        prop_assert_eq!(keys, names(&graph));
    }

    /// Property: a community is named after one of its members
    #[test]
    fn prop_community_identifiers_are_members(graph in call_graph()) {
        let detection = HierarchicalDetector::default().detect(&graph);
        for community in detection.assignment.values() {
            prop_assert_eq!(&detection.assignment[community], community);
        }
    }

    /// Property: every final community is internally connected
    #[test]
    fn prop_detected_communities_are_connected(graph in call_graph()) {
        let detection = HierarchicalDetector::default().detect(&graph);
        let flat = CommunityAssignment::from_names(&graph, &detection.assignment).unwrap();
        prop_assert!(is_connected_partition(&graph, &flat));
    }

    /// Property: total weight is the same on every level of the hierarchy
    #[test]
    fn prop_aggregation_preserves_weight(graph in call_graph()) {
        let (hierarchy, _) = HierarchicalDetector::default().build_hierarchy(&graph);
        for level in hierarchy.levels() {
            prop_assert_eq!(level.graph().total_weight(), graph.total_weight());
        }
        prop_assert_eq!(hierarchy.top().total_weight(), graph.total_weight());
    }

    /// Property: aggregating any assignment preserves weight and modularity
    #[test]
    fn prop_aggregate_keeps_weight_and_modularity((graph, assignment) in graph_with_assignment()) {
        let coarse = aggregate(&graph, &assignment).unwrap();
        prop_assert_eq!(coarse.graph.total_weight(), graph.total_weight());
        prop_assert_eq!(coarse.graph.vertex_count(), assignment.community_count());

        let fine = modularity(&graph, &assignment);
        let lifted = modularity(&coarse.graph, &CommunityAssignment::singletons(&coarse.graph));
        prop_assert!((fine - lifted).abs() < 1e-9);
    }

    /// Property: refinement output is finer than its input and connected
    #[test]
    fn prop_refinement_only_splits((graph, assignment) in graph_with_assignment()) {
        let refined = refine(&graph, &assignment);

        prop_assert!(is_connected_partition(&graph, &refined));
        prop_assert!(refined.community_count() >= assignment.community_count());
        for u in graph.vertices() {
            for v in graph.vertices() {
                if refined.community_of(u) == refined.community_of(v) {
                    prop_assert_eq!(assignment.community_of(u), assignment.community_of(v));
                }
            }
        }
    }

    /// Property: refinement never separates vertices joined by an edge
    /// inside one input community
    #[test]
    fn prop_refinement_splits_no_further_than_needed(
        (graph, assignment) in graph_with_assignment()
    ) {
        let refined = refine(&graph, &assignment);
        for (u, v, _) in graph.edges() {
            if assignment.community_of(u) == assignment.community_of(v) {
                prop_assert_eq!(refined.community_of(u), refined.community_of(v));
            }
        }
    }

    /// Property: more sweeps never lower modularity
    #[test]
    fn prop_modularity_is_non_decreasing_over_sweeps(graph in call_graph()) {
        let start = CommunityAssignment::singletons(&graph);
        let mut previous = modularity(&graph, &start);
        for sweeps in 1..6 {
            let result = optimize(&graph, start.clone(), sweeps);
            let current = modularity(&graph, &result.assignment);
            prop_assert!(current >= previous - 1e-9);
            prop_assert!(result.modularity_gain >= 0.0);
            previous = current;
        }
    }

    /// Property: a sweep that moves anything strictly raises modularity by
    /// exactly the reported gain
    #[test]
    fn prop_every_moving_sweep_strictly_improves(graph in call_graph()) {
        let mut assignment = CommunityAssignment::singletons(&graph);
        for _ in 0..100 {
            let before = modularity(&graph, &assignment);
            let step = optimize(&graph, assignment.clone(), 1);
            let after = modularity(&graph, &step.assignment);

            prop_assert_eq!(step.improved, step.moves > 0);
            if step.moves > 0 {
                prop_assert!(step.modularity_gain > 0.0);
                prop_assert!(after > before);
            } else {
                prop_assert_eq!(step.modularity_gain, 0.0);
            }
            prop_assert!((after - before - step.modularity_gain).abs() < 1e-9);

            if !step.improved {
                break;
            }
            assignment = step.assignment;
        }
    }

    /// Property: identical input yields identical output
    #[test]
    fn prop_detection_is_deterministic(graph in call_graph()) {
        let detector = HierarchicalDetector::default();
        prop_assert_eq!(detector.detect(&graph), detector.detect(&graph));
    }

    /// Property: re-running from a local optimum leaves it unchanged
    #[test]
    fn prop_rerun_from_local_optimum_is_identity(graph in call_graph()) {
        let detector = HierarchicalDetector::default();
        let first = detector.detect(&graph);

        let flat = CommunityAssignment::from_names(&graph, &first.assignment).unwrap();
        let coarse = aggregate(&graph, &flat).unwrap();
        let coarse_start = CommunityAssignment::singletons(&coarse.graph);
        prop_assume!(is_local_optimum(&coarse.graph, &coarse_start));

        let second = redetect(&graph, &first.assignment, &detector).unwrap();
        prop_assert_eq!(second.assignment, first.assignment);
    }

    /// Property: re-detection names communities after members whatever
    /// identifiers the prior used
    #[test]
    fn prop_redetect_identifiers_are_members((graph, prior) in graph_with_assignment()) {
        let result = redetect(&graph, &prior.to_names(&graph), &HierarchicalDetector::default())
            .unwrap();
        for community in result.assignment.values() {
            prop_assert_eq!(&result.assignment[community], community);
        }
    }
}
