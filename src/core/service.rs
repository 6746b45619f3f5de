//! Service and builder records
//!
//! These are the flat records the inventory hands to the resolver and the
//! assembly pipeline. The resolver only reads `name` and `depends_on`; the
//! pipeline additionally reads `source` and `builder`. Everything else a
//! service carries lives in its compose fragment and is opaque here.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A named, independently configurable unit of the development environment.
///
/// `name` is the primary key across every lookup. `depends_on` keeps the
/// order it was declared in and may name services that do not exist; those
/// resolve to terminal leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Unique service name
    pub name: String,
    /// Names of the services this one needs, in declaration order
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Path of the compose fragment that defines the service
    pub source: PathBuf,
    /// Builder profile used to build the service, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builder: Option<String>,
    /// Module the service belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Free-form description shown by `devstack list`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Service {
    /// Create a service with no dependencies and no builder.
    pub fn new(name: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            depends_on: Vec::new(),
            source: source.into(),
            builder: None,
            module: None,
            description: None,
        }
    }

    /// Set the dependency list.
    #[must_use]
    pub fn with_depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Set the builder profile.
    #[must_use]
    pub fn with_builder(mut self, builder: impl Into<String>) -> Self {
        self.builder = Some(builder.into());
        self
    }

    /// Set the module.
    #[must_use]
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }
}

/// A reusable configuration template shared by services of one technology stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Builder {
    /// Unique builder name
    pub name: String,
    /// Path of the compose fragment holding the template
    pub source: PathBuf,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Builder {
    /// Create a builder record.
    pub fn new(name: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            description: None,
        }
    }
}

/// Find a service by name in a flat list.
#[must_use]
pub fn find_service<'a>(services: &'a [Service], name: &str) -> Option<&'a Service> {
    services.iter().find(|s| s.name == name)
}
