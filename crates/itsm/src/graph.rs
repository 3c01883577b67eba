//! CMDB dependency graph and the relationship guard.
//!
//! The graph is a plain value: a list of directed, typed edges between
//! configuration items. [`DependencyGraph::check_edge`] is the guard every
//! relationship mutation passes through. It runs a fixed pipeline and stops
//! at the first failure: endpoint completeness, self-reference, duplicate
//! edge, cycle. All methods are pure; nothing here touches storage.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::{Rejection, Relationship, Verdict};

/// One directed edge in the dependency graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Id of the relationship record backing this edge
    pub id: String,
    /// Id of the source CI
    pub source: String,
    /// Relationship type token
    #[serde(rename = "type")]
    pub rel_type: String,
    /// Id of the target CI
    pub target: String,
}

impl Edge {
    /// Create an edge
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        rel_type: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            rel_type: rel_type.into(),
            target: target.into(),
        }
    }
}

impl From<&Relationship> for Edge {
    fn from(rel: &Relationship) -> Self {
        Edge::new(
            rel.id.clone(),
            rel.source.clone(),
            rel.rel_type.clone(),
            rel.target.clone(),
        )
    }
}

/// The CI dependency graph as a validation input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyGraph {
    edges: Vec<Edge>,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph from existing edges
    pub fn from_edges(edges: Vec<Edge>) -> Self {
        Self { edges }
    }

    /// Add an edge to the graph
    pub fn insert(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// All edges in the graph
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of edges in the graph
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// True when the graph has no edges
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Validate one proposed edge against this graph
    ///
    /// `excluding` names the relationship record being updated, if any. Its
    /// stored edge is invisible to the checks, so the verdict describes the
    /// graph as it would look after the update.
    ///
    /// Checks run in a fixed order and the first failure wins:
    /// completeness, self-reference, duplication, cycle.
    pub fn check_edge(
        &self,
        source: Option<&str>,
        rel_type: Option<&str>,
        target: Option<&str>,
        excluding: Option<&str>,
    ) -> Verdict {
        let (source, rel_type, target) = match (source, rel_type, target) {
            (Some(source), Some(rel_type), Some(target))
                if !source.trim().is_empty()
                    && !rel_type.trim().is_empty()
                    && !target.trim().is_empty() =>
            {
                (source, rel_type, target)
            }
            _ => return Rejection::incomplete_endpoints().into(),
        };

        if source == target {
            return Rejection::self_reference().into();
        }

        let duplicate = self.live_edges(excluding).any(|edge| {
            edge.source == source && edge.rel_type == rel_type && edge.target == target
        });
        if duplicate {
            return Rejection::duplicate_edge().into();
        }

        if self.leads_back_to(source, target, &HashSet::new(), excluding) {
            return Rejection::circular_dependency().into();
        }

        Verdict::Accepted
    }

    /// Edges visible to a check, with the excluded record filtered out
    fn live_edges<'a>(&'a self, excluding: Option<&'a str>) -> impl Iterator<Item = &'a Edge> {
        self.edges
            .iter()
            .filter(move |edge| excluding.map_or(true, |id| edge.id != id))
    }

    /// Depth-first walk from `from` looking for `needle`
    ///
    /// Each branch gets its own copy of the visited set, so one branch
    /// cannot mask nodes another branch still has to examine. Revisiting a
    /// node already on the current path means the stored graph itself holds
    /// a cycle; that counts as a hit, which also guarantees termination.
    fn leads_back_to<'a>(
        &'a self,
        needle: &str,
        from: &'a str,
        visited: &HashSet<&'a str>,
        excluding: Option<&'a str>,
    ) -> bool {
        if from == needle {
            return true;
        }
        if visited.contains(from) {
            return true;
        }

        let mut visited = visited.clone();
        visited.insert(from);

        self.live_edges(excluding)
            .filter(|edge| edge.source == from)
            .any(|edge| self.leads_back_to(needle, &edge.target, &visited, excluding))
    }
}
