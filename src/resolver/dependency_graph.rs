//! Whole-project dependency graph.
//!
//! The tree builder and the name resolver tolerate cycles silently. This graph
//! is where cycles get *reported*: the generator calls
//! [`DependencyGraph::detect_cycles`] before writing anything and logs the
//! cycle path, and `devstack tree --invert` walks its incoming edges to show
//! what depends on a service.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use super::DependencyNode;
use crate::core::{DevstackError, Service};

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Node has not been visited.
    White,
    /// Node is currently being visited (in the DFS stack).
    Gray,
    /// Node has been fully visited.
    Black,
}

/// Directed graph over service names; an edge `a → b` means `a` depends on `b`.
///
/// Dangling `depends_on` names become nodes too, so they show up in reports.
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Build the graph from every service's `depends_on` list.
    pub fn from_services(services: &[Service]) -> Self {
        let mut graph = Self::new();
        for service in services {
            graph.ensure_node(&service.name);
            for dep in &service.depends_on {
                graph.add_dependency(&service.name, dep);
            }
        }
        graph
    }

    fn ensure_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&index) = self.node_map.get(name) {
            index
        } else {
            let index = self.graph.add_node(name.to_string());
            self.node_map.insert(name.to_string(), index);
            index
        }
    }

    /// Record that `from` depends on `to`. Duplicate edges are ignored.
    pub fn add_dependency(&mut self, from: &str, to: &str) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);

        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    /// Detect cycles using DFS with colors.
    ///
    /// Returns [`DevstackError::CircularDependency`] naming the first cycle found.
    pub fn detect_cycles(&self) -> Result<(), DevstackError> {
        match self.find_cycle() {
            Some(cycle) => Err(DevstackError::CircularDependency {
                chain: cycle.join(" → "),
            }),
            None => Ok(()),
        }
    }

    /// The first cycle found, closed by repeating its start node, if any.
    #[must_use]
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut colors: HashMap<NodeIndex, Color> =
            self.graph.node_indices().map(|n| (n, Color::White)).collect();
        let mut path: Vec<NodeIndex> = Vec::new();

        for node in self.graph.node_indices() {
            if matches!(colors.get(&node), Some(Color::White))
                && let Some(cycle) = self.dfs_visit(node, &mut colors, &mut path)
            {
                return Some(cycle.into_iter().map(|idx| self.graph[idx].clone()).collect());
            }
        }

        None
    }

    fn dfs_visit(
        &self,
        node: NodeIndex,
        colors: &mut HashMap<NodeIndex, Color>,
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<NodeIndex>> {
        colors.insert(node, Color::Gray);
        path.push(node);

        for neighbor in self.graph.neighbors(node) {
            match colors.get(&neighbor) {
                Some(Color::Gray) => {
                    // The gray neighbor is on the path; the cycle starts there
                    let start = path.iter().position(|n| *n == neighbor)?;
                    let mut cycle = path[start..].to_vec();
                    cycle.push(neighbor);
                    return Some(cycle);
                }
                Some(Color::White) => {
                    if let Some(cycle) = self.dfs_visit(neighbor, colors, path) {
                        return Some(cycle);
                    }
                }
                _ => {}
            }
        }

        path.pop();
        colors.insert(node, Color::Black);
        None
    }

    /// Direct dependents of `name`, sorted by name.
    #[must_use]
    pub fn dependents(&self, name: &str) -> Vec<String> {
        let Some(&idx) = self.node_map.get(name) else {
            return Vec::new();
        };
        let mut names: Vec<String> = self
            .graph
            .neighbors_directed(idx, Direction::Incoming)
            .map(|n| self.graph[n].clone())
            .collect();
        names.sort();
        names
    }

    /// Tree of everything that depends on `name`, directly or transitively.
    ///
    /// Cycles are cut per path the same way [`build_tree`](super::build_tree)
    /// cuts them.
    #[must_use]
    pub fn inverted_tree(&self, name: &str) -> DependencyNode {
        let mut ancestors = Vec::new();
        self.invert(name, &mut ancestors)
    }

    fn invert(&self, name: &str, ancestors: &mut Vec<String>) -> DependencyNode {
        if ancestors.iter().any(|a| a == name) {
            return DependencyNode::leaf(name);
        }

        ancestors.push(name.to_string());
        let dependencies = self
            .dependents(name)
            .iter()
            .map(|dependent| self.invert(dependent, ancestors))
            .collect();
        ancestors.pop();

        DependencyNode {
            name: name.to_string(),
            dependencies,
        }
    }

    /// Check if the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Get the total number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the total number of edges (dependencies) in the graph.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}
