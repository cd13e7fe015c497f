//! Community assignments and the aggregation hierarchy.

use std::collections::{BTreeMap, BTreeSet};

use crate::errors::{Error, Result};
use crate::graph::{CallGraph, VertexId};

/// How many offending identities an [`Error::IncompleteAssignment`] lists.
const SAMPLE_SIZE: usize = 5;

/// Total mapping from the vertices of one graph level to community
/// identifiers, where each identifier is itself a vertex of that level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityAssignment {
    labels: Vec<VertexId>,
}

impl CommunityAssignment {
    /// Every vertex in its own community.
    pub fn singletons(graph: &CallGraph) -> Self {
        Self {
            labels: graph.vertices().collect(),
        }
    }

    /// Assignment from per-vertex labels, checked against `graph`.
    pub fn from_labels(graph: &CallGraph, labels: Vec<VertexId>) -> Result<Self> {
        if labels.len() != graph.vertex_count() {
            return Err(Error::IncompleteAssignment {
                missing: graph.vertex_count().saturating_sub(labels.len()),
                stale: labels.len().saturating_sub(graph.vertex_count()),
                sample: Vec::new(),
            });
        }
        if let Some(bad) = labels.iter().find(|c| c.index() >= graph.vertex_count()) {
            return Err(Error::UnknownCommunity(bad.to_string()));
        }
        Ok(Self { labels })
    }

    /// Assignment from an identity-keyed map such as a previous run's output.
    ///
    /// Fails unless the key set equals the vertex set exactly and every
    /// community identifier names a vertex.
    pub fn from_names(graph: &CallGraph, assignment: &BTreeMap<String, String>) -> Result<Self> {
        let missing: Vec<&str> = graph
            .vertices()
            .map(|v| graph.name(v))
            .filter(|name| !assignment.contains_key(*name))
            .collect();
        let stale: Vec<&str> = assignment
            .keys()
            .map(String::as_str)
            .filter(|name| !graph.contains(name))
            .collect();

        if !missing.is_empty() || !stale.is_empty() {
            return Err(Error::IncompleteAssignment {
                missing: missing.len(),
                stale: stale.len(),
                sample: missing
                    .iter()
                    .chain(stale.iter())
                    .take(SAMPLE_SIZE)
                    .map(|s| s.to_string())
                    .collect(),
            });
        }

        let labels = graph
            .vertices()
            .map(|v| {
                let community = &assignment[graph.name(v)];
                graph
                    .id_of(community)
                    .ok_or_else(|| Error::UnknownCommunity(community.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { labels })
    }

    /// Community of `vertex`.
    pub fn community_of(&self, vertex: VertexId) -> VertexId {
        self.labels[vertex.index()]
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of distinct communities.
    pub fn community_count(&self) -> usize {
        self.labels.iter().collect::<BTreeSet<_>>().len()
    }

    /// Members of each community, keyed by community identifier.
    pub fn communities(&self) -> BTreeMap<VertexId, Vec<VertexId>> {
        let mut groups: BTreeMap<VertexId, Vec<VertexId>> = BTreeMap::new();
        for (vertex, &community) in self.labels.iter().enumerate() {
            groups.entry(community).or_default().push(VertexId::new(vertex));
        }
        groups
    }

    /// Aggregate weighted degree `Σ_C` of every community, indexed by
    /// community identifier. Recomputed from the labels on every call.
    pub fn community_degrees(&self, graph: &CallGraph) -> Vec<u64> {
        let mut sigma = vec![0u64; self.labels.len()];
        for (vertex, &community) in self.labels.iter().enumerate() {
            sigma[community.index()] += graph.degree(VertexId::new(vertex));
        }
        sigma
    }

    /// Relabel every community with its member whose identity sorts first.
    ///
    /// Local moving can leave a community labelled by a vertex that has since
    /// moved elsewhere; after this call every identifier is a member.
    pub fn canonicalize(&self, graph: &CallGraph) -> Self {
        let mut representative: BTreeMap<VertexId, VertexId> = BTreeMap::new();
        for (vertex, &community) in self.labels.iter().enumerate() {
            let vertex = VertexId::new(vertex);
            representative
                .entry(community)
                .and_modify(|rep| *rep = graph.lowest(*rep, vertex))
                .or_insert(vertex);
        }
        Self {
            labels: self.labels.iter().map(|c| representative[c]).collect(),
        }
    }

    /// Identity-keyed view for reporting and serialisation.
    pub fn to_names(&self, graph: &CallGraph) -> BTreeMap<String, String> {
        graph
            .vertices()
            .map(|v| {
                (
                    graph.name(v).to_string(),
                    graph.name(self.community_of(v)).to_string(),
                )
            })
            .collect()
    }

    pub(crate) fn labels(&self) -> &[VertexId] {
        &self.labels
    }

    pub(crate) fn into_labels(self) -> Vec<VertexId> {
        self.labels
    }

    pub(crate) fn from_labels_unchecked(labels: Vec<VertexId>) -> Self {
        Self { labels }
    }
}

/// One aggregation round: the graph it ran on, the assignment that was
/// collapsed, and where each vertex landed in the next level.
#[derive(Debug, Clone)]
pub struct Level {
    graph: CallGraph,
    assignment: CommunityAssignment,
    projection: Vec<VertexId>,
}

impl Level {
    pub(crate) fn new(
        graph: CallGraph,
        assignment: CommunityAssignment,
        projection: Vec<VertexId>,
    ) -> Self {
        Self {
            graph,
            assignment,
            projection,
        }
    }

    pub fn graph(&self) -> &CallGraph {
        &self.graph
    }

    pub fn assignment(&self) -> &CommunityAssignment {
        &self.assignment
    }

    /// Super-vertex of `vertex` in the next level's graph.
    pub fn project(&self, vertex: VertexId) -> VertexId {
        self.projection[vertex.index()]
    }
}

/// Ordered graph levels produced by successive aggregation rounds.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    levels: Vec<Level>,
    top: CallGraph,
    /// Base-graph vertex that each top-level vertex is named after.
    origin: Vec<VertexId>,
}

impl Hierarchy {
    pub(crate) fn new(levels: Vec<Level>, top: CallGraph, origin: Vec<VertexId>) -> Self {
        Self { levels, top, origin }
    }

    /// Aggregation rounds performed.
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// The coarsest graph, on which no further improvement was found.
    pub fn top(&self) -> &CallGraph {
        &self.top
    }

    /// The graph detection started from.
    pub fn base(&self) -> &CallGraph {
        self.levels.first().map(Level::graph).unwrap_or(&self.top)
    }

    /// Flat assignment of the base graph: each vertex is followed through
    /// every level to its top-level community.
    pub fn flatten(&self) -> CommunityAssignment {
        let labels = self
            .base()
            .vertices()
            .map(|vertex| {
                let top = self
                    .levels
                    .iter()
                    .fold(vertex, |current, level| level.project(current));
                self.origin[top.index()]
            })
            .collect();
        CommunityAssignment::from_labels_unchecked(labels)
    }
}
