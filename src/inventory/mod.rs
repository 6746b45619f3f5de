//! Project inventory: services, builders and their compose fragments.
//!
//! The inventory is the only layer that knows where things live on disk. It
//! loads `devstack.toml`, hands flat [`Service`] and [`Builder`] records to
//! the resolver, and reads the YAML documents those records point at.
//!
//! ```text
//! project/
//! ├── devstack.toml
//! ├── builders/node.docker-compose.yaml
//! └── services/modules/backend/api.docker-compose.yaml
//! ```
//!
//! Several services may share one compose file; [`Inventory::load_documents`]
//! parses each file once.

mod manifest;

pub use manifest::{BuilderEntry, Manifest, ServiceEntry};

use anyhow::{Context, Result};
use serde_yaml::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::core::{Builder, DevstackError, Service, find_service};
use crate::utils::fs::{MANIFEST_FILE, find_project_root};
use crate::utils::paths::clean_path;

/// Everything known about one project.
#[derive(Debug, Clone)]
pub struct Inventory {
    root: PathBuf,
    manifest: Manifest,
    services: Vec<Service>,
    builders: Vec<Builder>,
}

impl Inventory {
    /// Load the manifest at `manifest_path`; its directory becomes the project root.
    ///
    /// The root is made absolute against the current directory so that it
    /// can be related to any output directory.
    pub fn load(manifest_path: &Path) -> Result<Self> {
        if !manifest_path.exists() {
            return Err(DevstackError::ManifestNotFound.into());
        }
        let manifest = Manifest::load(manifest_path)?;
        let manifest_path = std::path::absolute(manifest_path).with_context(|| {
            format!("Failed to resolve manifest path: {}", manifest_path.display())
        })?;
        let root = manifest_path
            .parent()
            .map(clean_path)
            .ok_or_else(|| anyhow::anyhow!("Manifest path has no parent directory"))?;

        Ok(Self::from_manifest(root, manifest))
    }

    /// Find `devstack.toml` in `start` or an ancestor and load it.
    pub fn discover(start: &Path) -> Result<Self> {
        let root = find_project_root(start)?;
        Self::load(&root.join(MANIFEST_FILE))
    }

    pub fn from_manifest(root: PathBuf, manifest: Manifest) -> Self {
        let services = manifest.service_records();
        let builders = manifest.builder_records();
        tracing::debug!(
            "Loaded inventory at {}: {} services, {} builders",
            root.display(),
            services.len(),
            builders.len()
        );
        Self {
            root,
            manifest,
            services,
            builders,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    #[must_use]
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    #[must_use]
    pub fn builders(&self) -> &[Builder] {
        &self.builders
    }

    /// Look up a service, failing with [`DevstackError::ServiceNotFound`].
    pub fn service(&self, name: &str) -> Result<&Service, DevstackError> {
        find_service(&self.services, name).ok_or_else(|| DevstackError::ServiceNotFound {
            name: name.to_string(),
        })
    }

    /// Look up the builder used by `service`, if it names one.
    pub fn builder_for(&self, service: &Service) -> Result<Option<&Builder>, DevstackError> {
        let Some(name) = &service.builder else {
            return Ok(None);
        };
        self.builders.iter().find(|b| &b.name == name).map(Some).ok_or_else(|| {
            DevstackError::BuilderNotFound {
                name: name.clone(),
                service: service.name.clone(),
            }
        })
    }

    /// Module name to member service names.
    #[must_use]
    pub fn modules(&self) -> BTreeMap<String, Vec<String>> {
        self.manifest.modules()
    }

    /// Member services of `module`; empty when the module is unknown.
    #[must_use]
    pub fn module_services(&self, module: &str) -> Vec<String> {
        self.modules().remove(module).unwrap_or_default()
    }

    /// Absolute-or-root-relative location of a source path from the manifest.
    #[must_use]
    pub fn resolve_source(&self, source: &Path) -> PathBuf {
        self.root.join(source)
    }

    /// Read and parse one compose document.
    pub async fn load_document(&self, source: &Path) -> Result<Value> {
        let path = self.resolve_source(source);
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read compose file: {}", path.display()))?;
        parse_document(&content, &path)
    }

    /// Parse every compose file referenced by `services` and their builders, once each.
    ///
    /// Keys are the source paths as written in the manifest.
    pub async fn load_documents(&self, services: &[&Service]) -> Result<HashMap<PathBuf, Value>> {
        let mut documents = HashMap::new();

        for service in services {
            let mut sources = vec![service.source.clone()];
            if let Some(builder) = self.builder_for(service)? {
                sources.push(builder.source.clone());
            }
            for source in sources {
                if documents.contains_key(&source) {
                    continue;
                }
                let document = self.load_document(&source).await?;
                documents.insert(source, document);
            }
        }

        tracing::debug!("Parsed {} compose documents", documents.len());
        Ok(documents)
    }
}

/// Parse YAML text, mapping failures to [`DevstackError::FragmentParseError`].
pub fn parse_document(content: &str, path: &Path) -> Result<Value> {
    let document: Value =
        serde_yaml::from_str(content).map_err(|e| DevstackError::FragmentParseError {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;
    Ok(document)
}
