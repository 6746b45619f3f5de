//! Writing the assembled compose files.
//!
//! For every selected service the generator runs the assembly pipeline and
//! writes `<output-dir>/<service>/docker-compose.yaml`:
//!
//! ```yaml
//! # Generated by devstack from services/api.docker-compose.yaml. Do not edit.
//! services:
//!   api:
//!     build:
//!       context: ../../builders
//!     depends_on:
//!     - db
//! networks:
//!   backend: {}
//! ```
//!
//! It then writes `<output-dir>/docker-compose.yaml`, which `include`s each
//! per-service file in selection order, so `docker compose -f
//! local/docker-compose.yaml up` starts the whole selection.
//!
//! Services named in the selection without a manifest entry are skipped
//! with a warning. `depends_on` only names services that are generated too.
//! Dependency cycles are reported, not fatal: compose itself rejects cyclic
//! `depends_on` at startup with a clear message.

use anyhow::{Context, Result};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

use crate::assembly::{AssemblyContext, SpecPipeline, copy_file_scoped_keys};
use crate::core::{DevstackError, Service};
use crate::inventory::Inventory;
use crate::resolver::DependencyGraph;
use crate::utils::fs::safe_write;
use crate::utils::paths::{clean_path, relativize_value, to_slash};

/// File name used for every generated compose file.
pub const COMPOSE_FILE: &str = "docker-compose.yaml";

#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions {
    /// Render everything but write nothing.
    pub dry_run: bool,
}

/// One rendered file.
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    /// Service the file belongs to; `None` for the aggregate file.
    pub service: Option<String>,
    pub path: PathBuf,
    pub content: String,
}

/// What a generation produced.
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    /// Per-service files in selection order, then the aggregate file.
    pub files: Vec<GeneratedFile>,
    /// Selected names with no manifest entry.
    pub missing: Vec<String>,
    /// Rendered cycle path, when the project graph has one.
    pub cycle: Option<String>,
    pub dry_run: bool,
}

impl GenerationReport {
    /// Names of the services that got a file.
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.files.iter().filter_map(|f| f.service.as_deref())
    }
}

/// Runs the assembly pipeline for a selection and writes the results.
pub struct Generator<'a> {
    inventory: &'a Inventory,
    output_dir: PathBuf,
    pipeline: SpecPipeline,
}

impl<'a> Generator<'a> {
    /// A relative `output_dir` is taken relative to the project root.
    pub fn new(inventory: &'a Inventory, output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = clean_path(&inventory.root().join(output_dir.into()));
        Self {
            inventory,
            output_dir,
            pipeline: SpecPipeline::standard(),
        }
    }

    #[must_use]
    pub fn with_pipeline(mut self, pipeline: SpecPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render, and unless `dry_run` is set write, the files for `selection`.
    pub async fn generate(
        &self,
        selection: &[String],
        options: GenerateOptions,
    ) -> Result<GenerationReport> {
        let mut report = GenerationReport {
            dry_run: options.dry_run,
            ..GenerationReport::default()
        };

        let graph = DependencyGraph::from_services(self.inventory.services());
        if let Err(DevstackError::CircularDependency {
            chain,
        }) = graph.detect_cycles()
        {
            tracing::warn!("Circular dependency detected: {chain}");
            report.cycle = Some(chain);
        }

        let mut services: Vec<&Service> = Vec::with_capacity(selection.len());
        for name in selection {
            match self.inventory.service(name) {
                Ok(service) => services.push(service),
                Err(_) => {
                    tracing::warn!("Skipping '{name}': no such service in the manifest");
                    report.missing.push(name.clone());
                }
            }
        }

        let documents = self.inventory.load_documents(&services).await?;
        let generated: Vec<String> = services.iter().map(|s| s.name.clone()).collect();

        for service in &services {
            let file = self.render_service(service, &generated, &documents)?;
            report.files.push(file);
        }

        report.files.push(self.render_aggregate(&services)?);

        if !options.dry_run {
            for file in &report.files {
                safe_write(&file.path, &file.content)
                    .with_context(|| format!("Failed to write {}", file.path.display()))?;
                tracing::info!("Wrote {}", file.path.display());
            }
        }

        Ok(report)
    }

    fn render_service(
        &self,
        service: &Service,
        generated: &[String],
        documents: &std::collections::HashMap<PathBuf, Value>,
    ) -> Result<GeneratedFile> {
        let root = self.inventory.root();
        let destination = self.output_dir.join(&service.name);
        let document = documents
            .get(&service.source)
            .with_context(|| format!("Compose file for '{}' was not loaded", service.name))?;

        let mut ctx =
            AssemblyContext::new(root, service, document, &destination).with_selection(generated);
        if let Some(builder) = self.inventory.builder_for(service)? {
            let builder_document = documents
                .get(&builder.source)
                .with_context(|| format!("Compose file for builder '{}' was not loaded", builder.name))?;
            ctx = ctx.with_builder(builder, builder_document);
        }

        if ctx.service_fragment()?.is_none() {
            tracing::warn!(
                "'{}' has no entry under services in {}",
                service.name,
                service.source.display()
            );
        }

        let assembled = self.pipeline.assemble(&ctx)?;

        let mut services = Mapping::new();
        services.insert(Value::from(service.name.as_str()), Value::Mapping(assembled));
        let mut output = Mapping::new();
        output.insert(Value::from("services"), Value::Mapping(services));
        copy_file_scoped_keys(&mut output, document);

        // Included files resolve relative to the including file
        if let Some(include) = output.get_mut("include") {
            *include = relativize_value(include, root.join(&service.source), &destination);
        }

        let header = format!(
            "# Generated by devstack from {}. Do not edit.\n",
            to_slash(&service.source)
        );
        let body = serde_yaml::to_string(&output)?;

        Ok(GeneratedFile {
            service: Some(service.name.clone()),
            path: destination.join(COMPOSE_FILE),
            content: header + &body,
        })
    }

    fn render_aggregate(&self, services: &[&Service]) -> Result<GeneratedFile> {
        let include: Vec<Value> = services
            .iter()
            .map(|s| Value::from(format!("{}/{COMPOSE_FILE}", s.name)))
            .collect();

        let mut output = Mapping::new();
        output.insert(Value::from("include"), Value::Sequence(include));

        let body = serde_yaml::to_string(&output)?;
        Ok(GeneratedFile {
            service: None,
            path: self.output_dir.join(COMPOSE_FILE),
            content: format!("# Generated by devstack. Do not edit.\n{body}"),
        })
    }
}
