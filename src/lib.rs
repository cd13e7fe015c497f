//! Recovers latent module boundaries from call graphs.
//!
//! Call observations between methods (or classes) form a weighted directed
//! [`graph::CallGraph`]. [`community::HierarchicalDetector`] partitions it by
//! multi-level modularity optimisation with connectivity refinement, and
//! [`candidates::derive_candidates`] turns the partition into proposed
//! service boundaries with their externally called interface.

pub mod candidates;
pub mod cli;
pub mod community;
pub mod config;
pub mod errors;
pub mod graph;
pub mod report;

// Re-export commonly used types
pub use crate::candidates::{derive_candidates, ServiceCandidate};
pub use crate::community::{
    redetect, CommunityAssignment, Detection, DetectionWarning, HierarchicalDetector,
};
pub use crate::config::{DetectionConfig, ServicemapConfig};
pub use crate::errors::{Error, Result};
pub use crate::graph::{CallGraph, CallGraphBuilder, CallObservation, Granularity, VertexId};
