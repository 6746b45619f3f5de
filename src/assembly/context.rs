use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

use crate::core::{Builder, DevstackError, Service};

/// A builder record together with its parsed compose document.
#[derive(Debug, Clone, Copy)]
pub struct BuilderFragment<'a> {
    pub builder: &'a Builder,
    pub document: &'a Value,
}

/// Read-only inputs for one assembly run.
///
/// Source paths on [`Service`] and [`Builder`] are taken relative to
/// `project_root` unless already absolute. `destination_dir` is the directory
/// the assembled file will be written to. `selection`, when set, is the full
/// set of services being generated alongside this one.
#[derive(Debug, Clone)]
pub struct AssemblyContext<'a> {
    pub project_root: &'a Path,
    pub service: &'a Service,
    pub service_document: &'a Value,
    pub builder: Option<BuilderFragment<'a>>,
    pub destination_dir: &'a Path,
    pub selection: Option<&'a [String]>,
}

impl<'a> AssemblyContext<'a> {
    pub fn new(
        project_root: &'a Path,
        service: &'a Service,
        service_document: &'a Value,
        destination_dir: &'a Path,
    ) -> Self {
        Self {
            project_root,
            service,
            service_document,
            builder: None,
            destination_dir,
            selection: None,
        }
    }

    #[must_use]
    pub fn with_builder(mut self, builder: &'a Builder, document: &'a Value) -> Self {
        self.builder = Some(BuilderFragment {
            builder,
            document,
        });
        self
    }

    #[must_use]
    pub fn with_selection(mut self, names: &'a [String]) -> Self {
        self.selection = Some(names);
        self
    }

    /// Whether `name` is generated in this run. Always true without a selection.
    #[must_use]
    pub fn is_selected(&self, name: &str) -> bool {
        self.selection.is_none_or(|names| names.iter().any(|n| n == name))
    }

    /// Absolute location of the service's compose file.
    #[must_use]
    pub fn service_source(&self) -> PathBuf {
        self.project_root.join(&self.service.source)
    }

    /// Absolute location of the builder's compose file, if there is a builder.
    #[must_use]
    pub fn builder_source(&self) -> Option<PathBuf> {
        self.builder.map(|b| self.project_root.join(&b.builder.source))
    }

    /// The service's own entry, `services.<name>` of its document.
    ///
    /// `Ok(None)` when the entry is missing; an error when it exists but is
    /// not a mapping.
    pub fn service_fragment(&self) -> Result<Option<&'a Mapping>, DevstackError> {
        let entry = self
            .service_document
            .get("services")
            .and_then(|services| services.get(self.service.name.as_str()));
        expect_mapping(entry, &self.service.name)
    }

    /// The builder's service template.
    ///
    /// Looks up `services.<builder-name>` first and falls back to the first
    /// entry of the builder document's `services` map.
    pub fn builder_fragment(&self) -> Result<Option<&'a Mapping>, DevstackError> {
        let Some(fragment) = self.builder else {
            return Ok(None);
        };
        let Some(services) = fragment.document.get("services").and_then(Value::as_mapping) else {
            tracing::debug!("Builder '{}' has no services map", fragment.builder.name);
            return Ok(None);
        };

        let entry = services
            .get(fragment.builder.name.as_str())
            .or_else(|| services.iter().next().map(|(_, v)| v));
        expect_mapping(entry, &fragment.builder.name)
    }
}

fn expect_mapping<'v>(
    entry: Option<&'v Value>,
    name: &str,
) -> Result<Option<&'v Mapping>, DevstackError> {
    match entry {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Mapping(map)) => Ok(Some(map)),
        Some(_) => Err(DevstackError::MalformedFragment {
            name: name.to_string(),
            reason: "service definition is not a mapping".to_string(),
        }),
    }
}
