//! Upgrade graph as served by the release controller, and its predecessor view.
//!
//! The controller serves `{"nodes": [{"version", "payload"}], "edges": [[from, to]]}`
//! where edge entries are indices into `nodes`. Evaluation only needs the
//! reverse adjacency: for each target version, the versions it was upgraded from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single release node in the controller's graph document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub version: String,
    #[serde(default)]
    pub payload: String,
}

/// Raw graph document: nodes plus `[from, to]` index pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<[usize; 2]>,
}

/// An edge referenced a node index the document does not contain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("edge {edge} references node {index}, but the graph has {nodes} nodes")]
pub struct InvalidEdge {
    pub edge: usize,
    pub index: usize,
    pub nodes: usize,
}

/// Target version → source versions, in edge order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpgradeGraph(BTreeMap<String, Vec<String>>);

impl UpgradeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a node/edge document into the predecessor mapping.
    pub fn from_document(doc: &GraphDocument) -> Result<Self, InvalidEdge> {
        let mut graph = UpgradeGraph::new();
        let node = |edge: usize, index: usize| {
            doc.nodes.get(index).ok_or(InvalidEdge {
                edge,
                index,
                nodes: doc.nodes.len(),
            })
        };
        for (i, [from, to]) in doc.edges.iter().copied().enumerate() {
            let from = node(i, from)?;
            let to = node(i, to)?;
            graph.add_edge(from.version.clone(), to.version.clone());
        }
        Ok(graph)
    }

    /// Record that `to` was upgraded from `from`.
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.0.entry(to.into()).or_default().push(from.into());
    }

    /// Builder-style [`UpgradeGraph::add_edge`].
    pub fn with_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.add_edge(from, to);
        self
    }

    /// Versions `version` was upgraded from; empty when it has no recorded edges.
    pub fn predecessors(&self, version: &str) -> &[String] {
        self.0.get(version).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
