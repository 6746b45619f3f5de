//! Flat dependency closures.
//!
//! [`DependencyResolver`] answers "which services must run for these roots"
//! without building a tree. The result keeps first-discovery order: each root
//! is followed by its dependencies in pre-order, and later repeats are
//! dropped.
//!
//! Transitive expansion carries the same per-path ancestor guard as
//! [`build_tree`](super::build_tree), so cyclic graphs terminate. On acyclic
//! graphs the guard never fires and the output is the plain pre-order walk.

use std::collections::{HashMap, HashSet};

use crate::core::Service;

/// Computes dependency closures over a fixed set of services.
pub struct DependencyResolver<'a> {
    by_name: HashMap<&'a str, &'a Service>,
}

impl<'a> DependencyResolver<'a> {
    /// Index the services by name. When a name is defined twice the first
    /// definition wins, matching [`find_service`](crate::core::find_service).
    pub fn new(services: &'a [Service]) -> Self {
        let mut by_name = HashMap::with_capacity(services.len());
        for service in services {
            by_name.entry(service.name.as_str()).or_insert(service);
        }
        Self {
            by_name,
        }
    }

    /// Every root and everything reachable from it, each name exactly once.
    ///
    /// Roots without a service record are still included. Dangling
    /// `depends_on` entries are included but not expanded.
    #[must_use]
    pub fn full_dependency_list_including_transitive<S: AsRef<str>>(
        &self,
        root_names: &[S],
    ) -> Vec<String> {
        let mut ordered = Vec::new();
        for root in root_names {
            let root = root.as_ref();
            ordered.push(root.to_string());
            ordered.extend(self.transitive_dependencies(root));
        }

        let mut seen = HashSet::new();
        ordered.retain(|name| seen.insert(name.clone()));

        tracing::debug!("Resolved {} roots to {} services", root_names.len(), ordered.len());
        ordered
    }

    /// Pre-order transitive dependencies of `name`, not including `name`.
    ///
    /// May contain repeats when dependencies are shared; use
    /// [`full_dependency_list_including_transitive`](Self::full_dependency_list_including_transitive)
    /// for a deduplicated closure.
    #[must_use]
    pub fn transitive_dependencies(&self, name: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut ancestors: Vec<&str> = vec![name];
        self.walk(name, &mut ancestors, &mut out);
        out
    }

    fn walk<'b>(&self, name: &str, ancestors: &mut Vec<&'b str>, out: &mut Vec<String>)
    where
        'a: 'b,
    {
        let Some(&service) = self.by_name.get(name) else {
            return;
        };

        for dep in &service.depends_on {
            out.push(dep.clone());
            if ancestors.contains(&dep.as_str()) {
                continue;
            }
            ancestors.push(dep.as_str());
            self.walk(dep, ancestors, out);
            ancestors.pop();
        }
    }

    /// Whether a service record exists for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }
}
