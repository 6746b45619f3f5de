//! Dependency resolution for services.
//!
//! Three views over the same `depends_on` edges:
//!
//! - [`build_tree`] - one service's dependency tree, for rendering
//! - [`DependencyResolver`] - flat, deduplicated closure of a set of roots,
//!   used to decide which services get generated
//! - [`DependencyGraph`] - petgraph-backed whole-project graph for cycle
//!   reports and reverse lookups
//!
//! None of these treat a missing service or a cycle as an error. Missing
//! names are terminal leaves; cycles are cut on the path where they close.
//!
//! # Example
//!
//! ```rust
//! use devstack_cli::core::Service;
//! use devstack_cli::resolver::{DependencyResolver, build_tree};
//!
//! let services = vec![
//!     Service::new("api", "api.yaml").with_depends_on(["db"]),
//!     Service::new("db", "db.yaml"),
//! ];
//!
//! let tree = build_tree("api", &services);
//! assert_eq!(tree.dependencies[0].name, "db");
//!
//! let resolver = DependencyResolver::new(&services);
//! assert_eq!(resolver.full_dependency_list_including_transitive(&["api"]), vec!["api", "db"]);
//! ```

mod dependency_graph;
mod dependency_list;
mod dependency_tree;

pub use dependency_graph::DependencyGraph;
pub use dependency_list::DependencyResolver;
pub use dependency_tree::{DependencyNode, build_tree};
