//! Community detection on call graphs.
//!
//! Multi-level modularity optimisation in the Louvain style, with a
//! connectivity refinement between local moving and aggregation so that no
//! emitted community is internally disconnected.
//!
//! # Architecture
//!
//! One round on a graph level:
//!
//! 1. **Local moving** ([`optimize`]): every vertex starts alone and is
//!    repeatedly moved to the neighbouring community with the best exact
//!    modularity gain.
//! 2. **Refinement** ([`refine`]): communities are split into their
//!    connected components.
//! 3. **Aggregation** ([`aggregate`]): each community becomes a vertex of
//!    the next level, intra-community weight becoming a self-loop.
//!
//! [`HierarchicalDetector`] repeats rounds until local moving finds nothing
//! to do, then follows each base vertex up the [`Hierarchy`] to its final
//! community. [`redetect`] starts the same process from a previous result.
//!
//! All of it is sequential and deterministic: ties are broken by vertex
//! identity, never by enumeration order or hashing.
//!
//! # Example
//!
//! ```
//! use servicemap::community::HierarchicalDetector;
//! use servicemap::graph::{CallGraph, CallObservation};
//!
//! let graph = CallGraph::from_observations(vec![
//!     CallObservation::new("Orders.place", "Orders.validate", 5),
//!     CallObservation::new("Billing.charge", "Billing.invoice", 5),
//!     CallObservation::new("Orders.place", "Billing.charge", 1),
//! ])?;
//! let detection = HierarchicalDetector::default().detect(&graph);
//!
//! assert_eq!(detection.assignment["Orders.validate"], "Orders.place");
//! assert_eq!(detection.assignment["Billing.invoice"], "Billing.charge");
//! # Ok::<(), servicemap::Error>(())
//! ```

mod aggregation;
mod assignment;
mod detector;
mod modularity;
mod multi_run;
mod optimizer;
mod refinement;

pub use aggregation::{aggregate, Aggregation};
pub use assignment::{CommunityAssignment, Hierarchy, Level};
pub use detector::{Detection, DetectionWarning, HierarchicalDetector};
pub use modularity::modularity;
pub use multi_run::redetect;
pub use optimizer::{is_local_optimum, optimize, LocalMoving};
pub use refinement::{is_connected_partition, refine};
