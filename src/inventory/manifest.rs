//! The `devstack.toml` project manifest.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::ProjectSettings;
use crate::core::{Builder, DevstackError, Service};

/// `[builders.<name>]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuilderEntry {
    pub source: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `[services.<name>]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServiceEntry {
    pub source: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builder: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Parsed `devstack.toml`.
///
/// Tables are kept in `BTreeMap`s so listing order is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Manifest {
    #[serde(default)]
    pub settings: ProjectSettings,

    #[serde(default)]
    pub builders: BTreeMap<String, BuilderEntry>,

    #[serde(default)]
    pub services: BTreeMap<String, ServiceEntry>,
}

impl Manifest {
    /// Read, parse and validate a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest file: {}", path.display()))?;
        Self::parse(&content, path)
    }

    /// Parse and validate manifest text; `path` is used in error messages.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let manifest: Self = toml::from_str(content).map_err(|e| {
            DevstackError::ManifestParseError {
                file: path.display().to_string(),
                reason: e.to_string(),
            }
        })?;

        manifest.validate()?;
        Ok(manifest)
    }

    /// Structural checks that do not need the filesystem.
    ///
    /// A service naming an undefined builder is an error. A `depends-on`
    /// entry naming an undefined service is not; it is reported and later
    /// treated as a terminal leaf.
    pub fn validate(&self) -> Result<(), DevstackError> {
        for (name, entry) in &self.builders {
            check_name("builder", name)?;
            if entry.source.as_os_str().is_empty() {
                return Err(DevstackError::ManifestValidationError {
                    reason: format!("Missing required field 'source' for builder '{name}'"),
                });
            }
        }

        for (name, entry) in &self.services {
            check_name("service", name)?;
            if entry.source.as_os_str().is_empty() {
                return Err(DevstackError::ManifestValidationError {
                    reason: format!("Missing required field 'source' for service '{name}'"),
                });
            }
            if let Some(builder) = &entry.builder
                && !self.builders.contains_key(builder)
            {
                return Err(DevstackError::BuilderNotFound {
                    name: builder.clone(),
                    service: name.clone(),
                });
            }
            for dep in &entry.depends_on {
                if !self.services.contains_key(dep) {
                    tracing::warn!("Service '{name}' depends on undefined service '{dep}'");
                }
            }
        }

        Ok(())
    }

    /// Service records in name order.
    #[must_use]
    pub fn service_records(&self) -> Vec<Service> {
        self.services
            .iter()
            .map(|(name, entry)| Service {
                name: name.clone(),
                depends_on: entry.depends_on.clone(),
                source: entry.source.clone(),
                builder: entry.builder.clone(),
                module: entry.module.clone(),
                description: entry.description.clone(),
            })
            .collect()
    }

    /// Builder records in name order.
    #[must_use]
    pub fn builder_records(&self) -> Vec<Builder> {
        self.builders
            .iter()
            .map(|(name, entry)| Builder {
                name: name.clone(),
                source: entry.source.clone(),
                description: entry.description.clone(),
            })
            .collect()
    }

    /// Module name to member services, both in name order.
    #[must_use]
    pub fn modules(&self) -> BTreeMap<String, Vec<String>> {
        let mut modules: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, entry) in &self.services {
            if let Some(module) = &entry.module {
                modules.entry(module.clone()).or_default().push(name.clone());
            }
        }
        modules
    }
}

fn check_name(kind: &str, name: &str) -> Result<(), DevstackError> {
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(DevstackError::ManifestValidationError {
            reason: format!(
                "Invalid {kind} name '{name}': names become directory names and cannot contain path separators"
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[settings]
output-dir = "generated"

[builders.node]
source = "builders/node.docker-compose.yaml"
description = "Node.js dev image"

[services.api]
source = "services/modules/backend/api.docker-compose.yaml"
builder = "node"
depends-on = ["db", "cache"]
module = "backend"

[services.db]
source = "services/db.docker-compose.yaml"

[services.cache]
source = "services/cache.docker-compose.yaml"
module = "backend"
"#;

    fn parse(content: &str) -> Result<Manifest> {
        Manifest::parse(content, Path::new("devstack.toml"))
    }

    #[test]
    fn test_parse_sample() {
        let manifest = parse(SAMPLE).unwrap();

        assert_eq!(manifest.settings.output_dir, Some(PathBuf::from("generated")));
        assert_eq!(manifest.builders.len(), 1);
        assert_eq!(manifest.services.len(), 3);

        let api = &manifest.services["api"];
        assert_eq!(api.depends_on, vec!["db", "cache"]);
        assert_eq!(api.builder.as_deref(), Some("node"));
    }

    #[test]
    fn test_records_are_name_ordered() {
        let manifest = parse(SAMPLE).unwrap();
        let names: Vec<_> = manifest.service_records().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["api", "cache", "db"]);

        let builders = manifest.builder_records();
        assert_eq!(builders[0].name, "node");
        assert_eq!(builders[0].description.as_deref(), Some("Node.js dev image"));
    }

    #[test]
    fn test_modules() {
        let manifest = parse(SAMPLE).unwrap();
        let modules = manifest.modules();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules["backend"], vec!["api", "cache"]);
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = parse("").unwrap();
        assert!(manifest.services.is_empty());
        assert_eq!(manifest.settings, ProjectSettings::default());
    }

    #[test]
    fn test_unknown_builder_rejected() {
        let err = parse("[services.api]\nsource = \"a.yaml\"\nbuilder = \"python\"\n").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DevstackError>(),
            Some(DevstackError::BuilderNotFound { name, service }) if name == "python" && service == "api"
        ));
    }

    #[test]
    fn test_dangling_dependency_allowed() {
        let manifest = parse("[services.api]\nsource = \"a.yaml\"\ndepends-on = [\"ghost\"]\n").unwrap();
        assert_eq!(manifest.services["api"].depends_on, vec!["ghost"]);
    }

    #[test]
    fn test_invalid_name_rejected() {
        let err = parse("[services.\"a/b\"]\nsource = \"a.yaml\"\n").unwrap_err();
        assert!(err.to_string().contains("Invalid service name"));
    }

    #[test]
    fn test_syntax_error() {
        let err = parse("[services.api\nsource = 1").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DevstackError>(),
            Some(DevstackError::ManifestParseError { .. })
        ));
    }

    #[test]
    fn test_missing_source() {
        let err = parse("[services.api]\nsource = \"\"\n").unwrap_err();
        assert!(err.to_string().contains("Missing required field 'source'"));
    }
}
