//! Weighted call graph model.
//!
//! A [`CallGraph`] is built once from call observations and is read-only
//! afterwards. Vertex identities (method or class names) are interned into
//! dense [`VertexId`] indices at ingestion, so the community detection loops
//! never hash strings.
//!
//! # Edges and degrees
//!
//! Edges are directed and carry the accumulated call count. Repeated
//! observations of the same `(caller, callee)` pair fold into one edge;
//! self-loops are legal and retained.
//!
//! For modularity the graph is viewed as undirected: `degree(v)` is the sum of
//! out- and in-weights (a self-loop counts twice), so the degrees sum to
//! `2 * total_weight()`.
//!
//! # Module Structure
//!
//! ```text
//! graph/
//! ├── mod.rs          # CallGraph and read accessors (this file)
//! ├── builder.rs      # Ingestion of call observations
//! └── granularity.rs  # Method- vs class-level vertex identities
//! ```

mod builder;
mod granularity;

pub use builder::{CallGraphBuilder, CallObservation, DroppedObservations};
pub use granularity::{class_of, Granularity};

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::errors::Result;

/// Largest accepted total edge weight `m`.
///
/// Keeps degrees within `u64` and the scaled modularity gains within `i128`.
pub const MAX_TOTAL_WEIGHT: u64 = 1 << 62;

/// Dense index of a vertex within one graph level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(u32);

impl VertexId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position of the vertex in its graph.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Immutable weighted directed call graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallGraph {
    names: Vec<String>,
    index: HashMap<String, VertexId>,
    /// Position of each vertex when all names are sorted; used for tie-breaks.
    ranks: Vec<u32>,
    /// Outgoing edges per vertex, sorted by target, self-loops included.
    outgoing: Vec<Vec<(VertexId, u64)>>,
    /// Undirected neighbourhood per vertex (out + in merged), self-loops excluded.
    incident: Vec<Vec<(VertexId, u64)>>,
    self_loops: Vec<u64>,
    degrees: Vec<u64>,
    total_weight: u64,
}

impl CallGraph {
    /// Graph with every endpoint of `observations` as a vertex.
    ///
    /// Non-positive counts are dropped; repeated pairs accumulate. Fails
    /// when the accumulated weight exceeds [`MAX_TOTAL_WEIGHT`].
    pub fn from_observations<I>(observations: I) -> Result<Self>
    where
        I: IntoIterator<Item = CallObservation>,
    {
        let mut builder = CallGraphBuilder::new();
        for obs in observations {
            builder.observe(obs.caller, obs.callee, obs.count);
        }
        builder.build()
    }

    /// Assemble a graph from interned names and accumulated positive edge
    /// weights summing to at most [`MAX_TOTAL_WEIGHT`].
    pub(crate) fn from_parts(
        names: Vec<String>,
        edges: BTreeMap<(VertexId, VertexId), u64>,
    ) -> Self {
        let n = names.len();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), VertexId::new(i)))
            .collect();

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| names[a].cmp(&names[b]));
        let mut ranks = vec![0u32; n];
        for (rank, &vertex) in order.iter().enumerate() {
            ranks[vertex] = rank as u32;
        }

        let mut outgoing = vec![Vec::new(); n];
        let mut undirected: Vec<BTreeMap<VertexId, u64>> = vec![BTreeMap::new(); n];
        let mut self_loops = vec![0u64; n];
        let mut degrees = vec![0u64; n];
        let mut total_weight = 0u64;

        debug_assert!(
            edges.values().map(|&w| u128::from(w)).sum::<u128>() <= u128::from(MAX_TOTAL_WEIGHT),
            "edge weights exceed MAX_TOTAL_WEIGHT"
        );
        // BTreeMap iteration keeps every adjacency list sorted by target.
        for (&(source, target), &weight) in &edges {
            debug_assert!(weight > 0, "zero-weight edge reached the graph");
            outgoing[source.index()].push((target, weight));
            degrees[source.index()] += weight;
            degrees[target.index()] += weight;
            total_weight += weight;
            if source == target {
                self_loops[source.index()] += weight;
            } else {
                *undirected[source.index()].entry(target).or_insert(0) += weight;
                *undirected[target.index()].entry(source).or_insert(0) += weight;
            }
        }

        let incident = undirected
            .into_iter()
            .map(|neighbours| neighbours.into_iter().collect())
            .collect();

        Self {
            names,
            index,
            ranks,
            outgoing,
            incident,
            self_loops,
            degrees,
            total_weight,
        }
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of distinct directed edges, self-loops included.
    pub fn edge_count(&self) -> usize {
        self.outgoing.iter().map(Vec::len).sum()
    }

    /// All vertices in ingestion order.
    pub fn vertices(&self) -> impl ExactSizeIterator<Item = VertexId> + '_ {
        (0..self.names.len()).map(VertexId::new)
    }

    /// Identity of a vertex.
    pub fn name(&self, vertex: VertexId) -> &str {
        &self.names[vertex.index()]
    }

    /// Look up a vertex by identity.
    pub fn id_of(&self, name: &str) -> Option<VertexId> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Distinct outgoing `(target, weight)` pairs of a vertex.
    pub fn neighbors(&self, vertex: VertexId) -> &[(VertexId, u64)] {
        &self.outgoing[vertex.index()]
    }

    /// Distinct undirected neighbours with the combined weight of both
    /// directions. Self-loops are not listed.
    pub fn incident(&self, vertex: VertexId) -> &[(VertexId, u64)] {
        &self.incident[vertex.index()]
    }

    /// Weighted out+in degree, self-loops counted twice.
    pub fn degree(&self, vertex: VertexId) -> u64 {
        self.degrees[vertex.index()]
    }

    /// Weight of the self-loop on `vertex`, zero if none.
    pub fn self_loop(&self, vertex: VertexId) -> u64 {
        self.self_loops[vertex.index()]
    }

    /// Total edge weight `m`, self-loops included.
    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// Every directed edge as `(source, target, weight)`.
    pub fn edges(&self) -> impl Iterator<Item = (VertexId, VertexId, u64)> + '_ {
        self.outgoing.iter().enumerate().flat_map(|(source, targets)| {
            targets
                .iter()
                .map(move |&(target, weight)| (VertexId::new(source), target, weight))
        })
    }

    /// Position of the vertex's identity in lexicographic order.
    pub(crate) fn rank(&self, vertex: VertexId) -> u32 {
        self.ranks[vertex.index()]
    }

    /// The vertex whose identity sorts first.
    pub(crate) fn lowest(&self, a: VertexId, b: VertexId) -> VertexId {
        if self.rank(b) < self.rank(a) {
            b
        } else {
            a
        }
    }
}
