//! Hierarchical detector.
//!
//! Drives optimize → refine → aggregate rounds until a level yields no
//! further move, then folds the resulting hierarchy back onto the base
//! graph. Every round starts from singletons on a freshly built coarser
//! graph; earlier levels are kept untouched for composition.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use tracing::{debug, debug_span, warn};

use crate::config::DetectionConfig;
use crate::graph::{CallGraph, VertexId};

use super::aggregation::aggregate_unchecked;
use super::{is_local_optimum, modularity, optimize, refine};
use super::{CommunityAssignment, Hierarchy, Level};

/// Non-fatal conditions encountered during detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionWarning {
    /// An optimizer pass hit the sweep ceiling before reaching a local
    /// optimum; its best assignment so far was used.
    IterationLimitReached { level: usize, sweeps: usize },
    /// The aggregation ceiling was hit while moves were still available.
    LevelLimitReached { levels: usize },
}

impl fmt::Display for DetectionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IterationLimitReached { level, sweeps } => write!(
                f,
                "level {level}: no local optimum after {sweeps} sweeps, using best assignment found"
            ),
            Self::LevelLimitReached { levels } => write!(
                f,
                "stopped after {levels} aggregation rounds with improving moves left"
            ),
        }
    }
}

/// Outcome of a detection run.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Every vertex of the input graph mapped to its community identifier.
    pub assignment: BTreeMap<String, String>,
    /// Aggregation rounds performed.
    pub levels: usize,
    /// Modularity of the flat assignment on the input graph.
    pub modularity: f64,
    pub warnings: Vec<DetectionWarning>,
}

impl Detection {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Number of distinct communities.
    pub fn community_count(&self) -> usize {
        self.assignment.values().collect::<BTreeSet<_>>().len()
    }
}

/// Multi-level community detector.
#[derive(Debug, Clone, Default)]
pub struct HierarchicalDetector {
    config: DetectionConfig,
}

impl HierarchicalDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Detect communities on `graph` and return the flat result.
    pub fn detect(&self, graph: &CallGraph) -> Detection {
        let (hierarchy, warnings) = self.build_hierarchy(graph);
        let flat = hierarchy.flatten();
        Detection {
            assignment: flat.to_names(graph),
            levels: hierarchy.levels().len(),
            modularity: modularity(graph, &flat),
            warnings,
        }
    }

    /// Run every round on `graph` and return the levels produced.
    pub fn build_hierarchy(&self, graph: &CallGraph) -> (Hierarchy, Vec<DetectionWarning>) {
        let span = debug_span!(
            "detect",
            vertices = graph.vertex_count(),
            edges = graph.edge_count()
        );
        let _enter = span.enter();

        let mut levels: Vec<Level> = Vec::new();
        let mut warnings = Vec::new();
        let mut current = graph.clone();
        let mut origin: Vec<VertexId> = graph.vertices().collect();

        loop {
            let depth = levels.len();
            let start = CommunityAssignment::singletons(&current);

            if depth >= self.config.max_levels {
                if !is_local_optimum(&current, &start) {
                    warn!(levels = depth, "Aggregation ceiling reached with moves left");
                    warnings.push(DetectionWarning::LevelLimitReached { levels: depth });
                }
                break;
            }

            let pass = optimize(&current, start, self.config.max_iterations);
            if !pass.converged {
                warn!(
                    level = depth,
                    sweeps = pass.sweeps,
                    "Local moving did not converge, using best assignment found"
                );
                warnings.push(DetectionWarning::IterationLimitReached {
                    level: depth,
                    sweeps: pass.sweeps,
                });
            }
            if !pass.improved {
                debug!(level = depth, "No improving move, converged");
                break;
            }

            let assignment = if self.config.refine {
                refine(&current, &pass.assignment)
            } else {
                pass.assignment.canonicalize(&current)
            };
            let communities = assignment.community_count();
            if communities == current.vertex_count() {
                debug!(level = depth, "Refinement undid every merge, converged");
                break;
            }

            let aggregation = aggregate_unchecked(&current, &assignment);
            debug!(
                level = depth,
                moves = pass.moves,
                sweeps = pass.sweeps,
                communities,
                gain = pass.modularity_gain,
                "Aggregated level"
            );

            origin = aggregation
                .origin
                .iter()
                .map(|community| origin[community.index()])
                .collect();
            let finer = std::mem::replace(&mut current, aggregation.graph);
            levels.push(Level::new(finer, assignment, aggregation.projection));
        }

        (Hierarchy::new(levels, current, origin), warnings)
    }
}
