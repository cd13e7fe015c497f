//! Human-readable dumps of the call graph and of a detected partition.
//!
//! Informational only; the JSON output is the authoritative result.

use std::collections::BTreeMap;
use std::fmt;

use crate::candidates::{derive_candidates, ServiceCandidate};
use crate::graph::{class_of, CallGraph};

/// Candidates of one partition, split by whether they span several classes.
///
/// Communities that stay inside a single class would not change the code's
/// structure and are listed as ignored.
#[derive(Debug, Clone)]
pub struct PartitionReport {
    title: String,
    vertex_count: usize,
    interesting: Vec<ServiceCandidate>,
    ignored: Vec<ServiceCandidate>,
}

impl PartitionReport {
    pub fn new(
        title: impl Into<String>,
        graph: &CallGraph,
        assignment: &BTreeMap<String, String>,
    ) -> Self {
        let (interesting, ignored): (Vec<_>, Vec<_>) = derive_candidates(graph, assignment)
            .into_iter()
            .partition(ServiceCandidate::crosses_classes);
        Self {
            title: title.into(),
            vertex_count: assignment.len(),
            interesting,
            ignored,
        }
    }

    /// Candidates touching more than one class.
    pub fn interesting(&self) -> &[ServiceCandidate] {
        &self.interesting
    }

    /// Candidates fully contained in one class.
    pub fn ignored(&self) -> &[ServiceCandidate] {
        &self.ignored
    }
}

impl fmt::Display for PartitionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(
            f,
            "{} vertices in {} communities ({} candidates, {} ignored)",
            self.vertex_count,
            self.interesting.len() + self.ignored.len(),
            self.interesting.len(),
            self.ignored.len()
        )?;

        for candidate in &self.interesting {
            writeln!(f)?;
            writeln!(
                f,
                "Candidate {} [{}]",
                candidate.id,
                candidate.classes.join(", ")
            )?;
            for member in &candidate.members {
                if candidate.interface.contains(member) {
                    writeln!(f, "  {member} (interface)")?;
                } else {
                    writeln!(f, "  {member}")?;
                }
            }
        }

        if !self.ignored.is_empty() {
            writeln!(f)?;
            writeln!(f, "Ignored (single class):")?;
            for candidate in &self.ignored {
                writeln!(
                    f,
                    "  {} [{}] {} members",
                    candidate.id,
                    candidate.classes.join(", "),
                    candidate.members.len()
                )?;
            }
        }
        Ok(())
    }
}

/// Listing of every call edge grouped by class and caller.
pub struct GraphListing<'a> {
    graph: &'a CallGraph,
}

/// Render `graph` for display.
pub fn render_graph(graph: &CallGraph) -> GraphListing<'_> {
    GraphListing { graph }
}

impl fmt::Display for GraphListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let graph = self.graph;
        let mut callers: Vec<_> = graph
            .vertices()
            .filter(|&v| !graph.neighbors(v).is_empty())
            .collect();
        callers.sort_by_key(|&v| graph.name(v));

        writeln!(
            f,
            "Call graph: {} vertices, {} edges, total weight {}",
            graph.vertex_count(),
            graph.edge_count(),
            graph.total_weight()
        )?;

        let mut current_class = None;
        for caller in callers {
            let name = graph.name(caller);
            let class = class_of(name);
            if current_class != Some(class) {
                writeln!(f, "{class}")?;
                current_class = Some(class);
            }
            writeln!(f, "  {name}")?;

            let mut calls: Vec<_> = graph
                .neighbors(caller)
                .iter()
                .map(|&(target, weight)| (graph.name(target), weight))
                .collect();
            calls.sort();
            for (callee, weight) in calls {
                writeln!(f, "    -> {callee} x{weight}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::CallObservation;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn graph() -> CallGraph {
        CallGraph::from_observations(vec![
            CallObservation::new("Orders.place", "Orders.validate", 3),
            CallObservation::new("Orders.place", "Billing.charge", 1),
            CallObservation::new("Billing.charge", "Billing.invoice", 2),
        ]).unwrap()
    }

    fn assignment(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_graph_listing() {
        let expected = indoc! {"
            Call graph: 4 vertices, 3 edges, total weight 6
            Billing
              Billing.charge
                -> Billing.invoice x2
            Orders
              Orders.place
                -> Billing.charge x1
                -> Orders.validate x3
        "};
        assert_eq!(render_graph(&graph()).to_string(), expected);
    }

    #[test]
    fn test_single_class_communities_are_ignored() {
        let graph = graph();
        let report = PartitionReport::new(
            "Detected",
            &graph,
            &assignment(&[
                ("Billing.charge", "Billing.charge"),
                ("Billing.invoice", "Billing.charge"),
                ("Orders.place", "Orders.place"),
                ("Orders.validate", "Orders.place"),
            ]),
        );

        assert!(report.interesting().is_empty());
        assert_eq!(report.ignored().len(), 2);
        assert!(report.to_string().contains("Ignored (single class):"));
    }

    #[test]
    fn test_cross_class_candidate_marks_interface_members() {
        let graph = graph();
        let report = PartitionReport::new(
            "Detected",
            &graph,
            &assignment(&[
                ("Billing.charge", "Billing.charge"),
                ("Billing.invoice", "Billing.charge"),
                ("Orders.place", "Billing.charge"),
                ("Orders.validate", "Orders.validate"),
            ]),
        );

        assert_eq!(report.interesting().len(), 1);
        let text = report.to_string();
        assert!(text.contains("Candidate Billing.charge [Billing, Orders]"));
        assert!(text.contains("  Orders.place\n"));
        assert!(!text.contains("Orders.place (interface)"));
    }
}
