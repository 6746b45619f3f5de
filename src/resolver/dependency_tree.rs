//! Dependency trees for a single service.
//!
//! A tree is built fresh for every call. Shared sub-dependencies are expanded
//! again in every branch that reaches them, so a diamond produces two
//! independent copies of the shared node. Cycles are broken per path: a name
//! that already appears among the current node's ancestors becomes a terminal
//! leaf instead of being expanded again.

use serde::Serialize;
use std::fmt;

use crate::core::{Service, find_service};

/// A service and its resolved dependencies.
///
/// `dependencies` mirrors the `depends_on` list of the matching [`Service`]
/// at construction time. Names without a matching service, and repeated
/// names along one path, have no dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyNode {
    /// Service name (or an unresolved reference)
    pub name: String,
    /// Child nodes in `depends_on` order
    pub dependencies: Vec<DependencyNode>,
}

impl DependencyNode {
    /// Create a terminal node.
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
        }
    }

    /// Whether this node has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Names of every node in pre-order, duplicates included.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        names.push(&self.name);
        for dep in &self.dependencies {
            dep.collect_names(names);
        }
    }

    /// Number of levels in the tree, counting the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.dependencies.iter().map(Self::depth).max().unwrap_or(0)
    }

    /// Render the tree with box-drawing connectors, root on the first line.
    ///
    /// `max_depth` limits how many levels below the root are shown.
    #[must_use]
    pub fn to_tree_string(&self, max_depth: Option<usize>) -> String {
        let mut result = format!("{}\n", self.name);
        let count = self.dependencies.len();
        for (i, dep) in self.dependencies.iter().enumerate() {
            dep.build_tree_string(&mut result, "", i + 1 == count, 1, max_depth);
        }
        result
    }

    fn build_tree_string(
        &self,
        result: &mut String,
        prefix: &str,
        is_last: bool,
        level: usize,
        max_depth: Option<usize>,
    ) {
        if max_depth.is_some_and(|max| level > max) {
            return;
        }

        let connector = if is_last {
            "└── "
        } else {
            "├── "
        };
        result.push_str(&format!("{prefix}{connector}{}\n", self.name));

        let child_prefix = if is_last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };

        let count = self.dependencies.len();
        for (i, dep) in self.dependencies.iter().enumerate() {
            dep.build_tree_string(result, &child_prefix, i + 1 == count, level + 1, max_depth);
        }
    }
}

impl fmt::Display for DependencyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_tree_string(None))
    }
}

/// Build the dependency tree of `name` from a flat list of services.
///
/// Never fails: dangling names and cycles both produce terminal leaves, so
/// tree renderers can still show them.
#[must_use]
pub fn build_tree(name: &str, services: &[Service]) -> DependencyNode {
    let mut ancestors = Vec::new();
    expand(name, services, &mut ancestors)
}

/// Depth-first expansion with an explicit stack of the names on the current path.
///
/// The stack is popped on the way back up, so sibling branches never see each
/// other's names.
fn expand(name: &str, services: &[Service], ancestors: &mut Vec<String>) -> DependencyNode {
    if ancestors.iter().any(|a| a == name) {
        tracing::debug!("Cycle through '{}' cut at depth {}", name, ancestors.len());
        return DependencyNode::leaf(name);
    }

    let Some(service) = find_service(services, name) else {
        tracing::debug!("'{}' has no service definition, treating as leaf", name);
        return DependencyNode::leaf(name);
    };

    if service.depends_on.is_empty() {
        return DependencyNode::leaf(name);
    }

    ancestors.push(name.to_string());
    let dependencies =
        service.depends_on.iter().map(|dep| expand(dep, services, ancestors)).collect();
    ancestors.pop();

    DependencyNode {
        name: name.to_string(),
        dependencies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn svc(name: &str, deps: &[&str]) -> Service {
        Service::new(name, format!("{name}.docker-compose.yaml")).with_depends_on(deps.to_vec())
    }

    /// Checks that every node mirrors its service's depends_on, recursively.
    fn assert_mirrors(node: &DependencyNode, services: &[Service]) {
        match find_service(services, &node.name) {
            Some(service) => {
                let names: Vec<&str> = node.dependencies.iter().map(|d| d.name.as_str()).collect();
                assert_eq!(names, service.depends_on);
            }
            None => assert!(node.is_leaf()),
        }
        for dep in &node.dependencies {
            assert_mirrors(dep, services);
        }
    }

    #[test]
    fn test_acyclic_tree_mirrors_depends_on() {
        let services = vec![
            svc("one", &[]),
            svc("two", &["one"]),
            svc("three", &["two"]),
            svc("four", &["three"]),
            svc("five", &[]),
            svc("six", &["five", "three"]),
            svc("seven", &["six", "four"]),
        ];

        let tree = build_tree("seven", &services);
        assert_mirrors(&tree, &services);
        assert_eq!(tree.depth(), 5);
    }

    #[test]
    fn test_shared_dependency_expanded_in_each_branch() {
        // a -> b, a -> c, b -> d, c -> d
        let services = vec![
            svc("a", &["b", "c"]),
            svc("b", &["d"]),
            svc("c", &["d"]),
            svc("d", &["e"]),
        ];

        let tree = build_tree("a", &services);
        assert_eq!(tree.dependencies[0].dependencies[0].name, "d");
        assert_eq!(tree.dependencies[1].dependencies[0].name, "d");
        // Both copies get their own full expansion
        assert_eq!(tree.dependencies[0].dependencies[0].dependencies[0].name, "e");
        assert_eq!(tree.dependencies[1].dependencies[0].dependencies[0].name, "e");
        assert_eq!(tree.names(), vec!["a", "b", "d", "e", "c", "d", "e"]);
    }

    #[test]
    fn test_two_node_cycle_terminates() {
        let services = vec![svc("A", &["B"]), svc("B", &["A"])];

        let tree = build_tree("A", &services);
        assert_eq!(tree.name, "A");
        assert_eq!(tree.dependencies.len(), 1);
        let b = &tree.dependencies[0];
        assert_eq!(b.name, "B");
        assert_eq!(b.dependencies.len(), 1);
        // Second occurrence of A on the path is terminal
        assert_eq!(b.dependencies[0].name, "A");
        assert!(b.dependencies[0].is_leaf());
    }

    #[test]
    fn test_self_dependency_terminates() {
        let services = vec![svc("loop", &["loop"])];

        let tree = build_tree("loop", &services);
        assert_eq!(tree.dependencies, vec![DependencyNode::leaf("loop")]);
    }

    #[test]
    fn test_cycle_guard_is_per_path() {
        // x appears in both branches; neither occurrence is on the other's path
        let services = vec![
            svc("root", &["left", "right"]),
            svc("left", &["x"]),
            svc("right", &["x"]),
            svc("x", &["y"]),
        ];

        let tree = build_tree("root", &services);
        for branch in &tree.dependencies {
            assert_eq!(branch.dependencies[0].name, "x");
            assert_eq!(branch.dependencies[0].dependencies[0].name, "y");
        }
    }

    #[test]
    fn test_dangling_dependency_is_leaf() {
        let services = vec![svc("api", &["ghost", "db"]), svc("db", &[])];

        let tree = build_tree("api", &services);
        assert_eq!(tree.dependencies.len(), 2);
        assert_eq!(tree.dependencies[0], DependencyNode::leaf("ghost"));
        assert!(tree.dependencies[1].is_leaf());
    }

    #[test]
    fn test_unknown_root_is_leaf() {
        let tree = build_tree("nothing", &[]);
        assert_eq!(tree, DependencyNode::leaf("nothing"));
    }

    #[test]
    fn test_each_call_builds_fresh_tree() {
        let mut services = vec![svc("a", &["b"]), svc("b", &[])];
        let first = build_tree("a", &services);
        services[1].depends_on.push("c".to_string());
        let second = build_tree("a", &services);

        assert!(first.dependencies[0].is_leaf());
        assert_eq!(second.dependencies[0].dependencies[0].name, "c");
    }

    #[test]
    fn test_tree_string() {
        let services = vec![svc("api", &["db", "cache"]), svc("db", &["volume"])];

        let rendered = build_tree("api", &services).to_tree_string(None);
        let expected = "api\n├── db\n│   └── volume\n└── cache\n";
        assert_eq!(rendered, expected);

        let shallow = build_tree("api", &services).to_tree_string(Some(1));
        assert_eq!(shallow, "api\n├── db\n└── cache\n");
    }

    #[test]
    fn test_json_shape() {
        let services = vec![svc("api", &["db"])];
        let json = serde_json::to_value(build_tree("api", &services)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "api",
                "dependencies": [{ "name": "db", "dependencies": [] }]
            })
        );
    }
}
