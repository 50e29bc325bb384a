//! Workspace dependency graph.
//!
//! Edges point from a package to the packages it depends on: `A -> B` means
//! "A depends on B". Dependents are found by walking incoming edges.

use std::collections::BTreeMap;

use changeplan_core::PackageInfo;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use sha2::{Digest, Sha256};

use crate::error::GraphError;

#[derive(Debug, Clone, Default)]
pub struct WorkspaceGraph {
    graph: DiGraph<String, ()>,
    nodes: BTreeMap<String, NodeIndex>,
}

impl WorkspaceGraph {
    /// Builds a graph from `(package, dependencies)` pairs.
    ///
    /// Dependencies naming packages outside the input are ignored, as are
    /// self-dependencies.
    #[must_use]
    pub fn from_dependencies<I, N, D, S>(packages: I) -> Self
    where
        I: IntoIterator<Item = (N, D)>,
        N: Into<String>,
        D: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries: Vec<(String, Vec<String>)> = packages
            .into_iter()
            .map(|(name, deps)| (name.into(), deps.into_iter().map(Into::into).collect()))
            .collect();

        let mut this = Self::default();
        for (name, _) in &entries {
            if !this.nodes.contains_key(name) {
                let index = this.graph.add_node(name.clone());
                this.nodes.insert(name.clone(), index);
            }
        }

        for (name, deps) in &entries {
            let from = this.nodes[name];
            for dep in deps {
                let Some(&to) = this.nodes.get(dep) else {
                    continue;
                };
                if from != to && this.graph.find_edge(from, to).is_none() {
                    this.graph.add_edge(from, to, ());
                }
            }
        }

        this
    }

    #[must_use]
    pub fn from_packages(packages: &[PackageInfo]) -> Self {
        Self::from_dependencies(
            packages
                .iter()
                .map(|p| (p.name.clone(), p.dependencies.clone())),
        )
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Package names in lexicographic order.
    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub(crate) fn node(&self, name: &str) -> Result<NodeIndex, GraphError> {
        self.nodes
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UnknownPackage {
                name: name.to_string(),
            })
    }

    pub(crate) fn name(&self, index: NodeIndex) -> &str {
        &self.graph[index]
    }

    pub(crate) fn dependent_nodes(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(index, Direction::Incoming)
    }

    fn neighbor_names(&self, name: &str, direction: Direction) -> Result<Vec<String>, GraphError> {
        let index = self.node(name)?;
        let mut names: Vec<String> = self
            .graph
            .neighbors_directed(index, direction)
            .map(|idx| self.graph[idx].clone())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Direct dependencies of a package (what it uses).
    ///
    /// # Errors
    ///
    /// Returns `GraphError::UnknownPackage` if `name` is not in the graph.
    pub fn dependencies(&self, name: &str) -> Result<Vec<String>, GraphError> {
        self.neighbor_names(name, Direction::Outgoing)
    }

    /// Direct dependents of a package (what uses it).
    ///
    /// # Errors
    ///
    /// Returns `GraphError::UnknownPackage` if `name` is not in the graph.
    pub fn dependents(&self, name: &str) -> Result<Vec<String>, GraphError> {
        self.neighbor_names(name, Direction::Incoming)
    }

    /// SHA-256 over the sorted adjacency list, hex encoded.
    ///
    /// Independent of the order packages and edges were added in.
    #[must_use]
    pub fn graph_hash(&self) -> String {
        let mut hasher = Sha256::new();
        for (name, &index) in &self.nodes {
            let mut deps: Vec<&str> = self
                .graph
                .neighbors_directed(index, Direction::Outgoing)
                .map(|idx| self.graph[idx].as_str())
                .collect();
            deps.sort_unstable();

            hasher.update(name.as_bytes());
            hasher.update([0u8]);
            hasher.update(deps.join(",").as_bytes());
            hasher.update([b'\n']);
        }
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> WorkspaceGraph {
        WorkspaceGraph::from_dependencies([
            ("api", vec!["core"]),
            ("cli", vec!["api", "core"]),
            ("core", vec![]),
        ])
    }

    #[test]
    fn dependencies_and_dependents() {
        let graph = graph();

        assert_eq!(graph.dependencies("cli").expect("known"), vec!["api", "core"]);
        assert_eq!(graph.dependents("core").expect("known"), vec!["api", "cli"]);
    }

    #[test]
    fn unknown_dependencies_are_ignored() {
        let graph = WorkspaceGraph::from_dependencies([("api", vec!["serde", "api"])]);

        assert!(graph.dependencies("api").expect("known").is_empty());
    }

    #[test]
    fn unknown_package_is_an_error() {
        assert!(matches!(
            graph().dependents("web"),
            Err(GraphError::UnknownPackage { .. })
        ));
    }

    #[test]
    fn hash_is_independent_of_insertion_order() {
        let reordered = WorkspaceGraph::from_dependencies([
            ("core", vec![]),
            ("cli", vec!["core", "api"]),
            ("api", vec!["core"]),
        ]);

        assert_eq!(graph().graph_hash(), reordered.graph_hash());
    }

    #[test]
    fn hash_changes_with_edges() {
        let without_edge = WorkspaceGraph::from_dependencies([
            ("api", vec![]),
            ("cli", vec!["api", "core"]),
            ("core", vec![]),
        ]);

        assert_ne!(graph().graph_hash(), without_edge.graph_hash());
        assert_eq!(graph().graph_hash().len(), 64);
    }

    #[test]
    fn packages_are_sorted() {
        let graph = graph();
        let names: Vec<&str> = graph.packages().collect();
        assert_eq!(names, vec!["api", "cli", "core"]);
    }
}
