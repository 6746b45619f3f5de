//! Specification assembly: turning fragments into one emittable service definition.
//!
//! A service's compose fragment, its builder's template and the resolved
//! dependency names are merged into a single `serde_yaml::Mapping` by a
//! [`SpecPipeline`]: an ordered list of [`AssemblyStep`]s that each own a
//! disjoint set of output keys.
//!
//! # Standard pipeline
//!
//! | Order | Step | Writes |
//! |-------|------|--------|
//! | 1 | [`BuilderStep`] | `build` (minus `args`), `command`, `entrypoint`, `working_dir`, `user` |
//! | 2 | [`DependsOnStep`] | `depends_on` |
//! | 3 | [`EnvFileStep`] | `env_file` |
//! | 4 | [`VolumesStep`] | `volumes` |
//! | 5 | [`VerbatimStep`] × 5 | `environment`, `labels`, `networks`, `image`, `healthcheck` |
//! | 6 | [`BuildArgsStep`] | `build.args` |
//! | 7 | [`PassThroughStep`] | every other key of the service fragment |
//!
//! File references (`build.context`, `env_file`, relative bind mounts) are
//! rewritten with [`relativize`](crate::utils::paths::relativize) against the
//! file that contributed them, so the output is valid from the destination
//! directory.
//!
//! File-scoped keys (`networks`, `volumes`, `secrets`, `include`, ... at the
//! document top level) are not per-service; the caller copies them once per
//! file with [`copy_file_scoped_keys`].
//!
//! # Example
//!
//! ```rust
//! use devstack_cli::assembly::{AssemblyContext, SpecPipeline};
//! use devstack_cli::core::Service;
//! use std::path::Path;
//!
//! let service = Service::new("api", "services/api.docker-compose.yaml").with_depends_on(["db"]);
//! let document: serde_yaml::Value =
//!     serde_yaml::from_str("services: {api: {image: 'node:20', ports: ['3000:3000']}}").unwrap();
//!
//! let ctx = AssemblyContext::new(Path::new("/project"), &service, &document, Path::new("/project/local/api"));
//! let output = SpecPipeline::standard().assemble(&ctx).unwrap();
//!
//! assert_eq!(output.get("image"), Some(&serde_yaml::Value::from("node:20")));
//! assert_eq!(output.get("depends_on").unwrap()[0], serde_yaml::Value::from("db"));
//! ```

mod context;
mod passthrough;
mod steps;

pub use context::{AssemblyContext, BuilderFragment};
pub use passthrough::{FILE_SCOPED_EXCLUDED_KEY, copy_file_scoped_keys};
pub use steps::{
    BUILDER_FIELDS, BuildArgsStep, BuilderStep, DependsOnStep, EnvFileStep, PassThroughStep,
    VERBATIM_FIELDS, VerbatimStep, VolumesStep,
};

use serde_yaml::Mapping;

use crate::core::DevstackError;
use crate::selector::Selector;

/// One merge step of the pipeline.
///
/// Steps read the context and write only the locations they declare in
/// [`targets`](Self::targets). Absent inputs are a no-op, never an error.
pub trait AssemblyStep: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Output locations this step writes.
    fn targets(&self) -> Vec<Selector>;

    /// Merge this step's fields into `output`.
    fn apply(&self, output: &mut Mapping, ctx: &AssemblyContext<'_>) -> Result<(), DevstackError>;
}

/// Ordered list of assembly steps.
pub struct SpecPipeline {
    steps: Vec<Box<dyn AssemblyStep>>,
}

impl SpecPipeline {
    /// An empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
        }
    }

    /// The standard pipeline used by the generator.
    ///
    /// The pass-through step is appended last and skips every top-level key
    /// claimed by the steps before it.
    #[must_use]
    pub fn standard() -> Self {
        let mut pipeline = Self::new()
            .with_step(BuilderStep)
            .with_step(DependsOnStep)
            .with_step(EnvFileStep)
            .with_step(VolumesStep);

        for field in VERBATIM_FIELDS {
            pipeline = pipeline.with_step(VerbatimStep::new(field));
        }

        pipeline = pipeline.with_step(BuildArgsStep);
        let reserved = pipeline.reserved_keys();
        pipeline.with_step(PassThroughStep::new(reserved))
    }

    /// Append a step.
    #[must_use]
    pub fn with_step(mut self, step: impl AssemblyStep + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Names of the steps in execution order.
    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|step| step.name())
    }

    /// Top-level keys written by the current steps, in step order, deduplicated.
    #[must_use]
    pub fn reserved_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for step in &self.steps {
            for target in step.targets() {
                if let Some(first) = target.fields().first()
                    && !keys.contains(first)
                {
                    keys.push(first.clone());
                }
            }
        }
        keys
    }

    /// Run every step, in order, against `output`.
    pub fn apply(
        &self,
        output: &mut Mapping,
        ctx: &AssemblyContext<'_>,
    ) -> Result<(), DevstackError> {
        for step in &self.steps {
            tracing::trace!("Assembling '{}': step {}", ctx.service.name, step.name());
            step.apply(output, ctx)?;
        }
        tracing::debug!("Assembled '{}' with {} keys", ctx.service.name, output.len());
        Ok(())
    }

    /// Run the pipeline against a fresh output mapping.
    pub fn assemble(&self, ctx: &AssemblyContext<'_>) -> Result<Mapping, DevstackError> {
        let mut output = Mapping::new();
        self.apply(&mut output, ctx)?;
        Ok(output)
    }
}

impl Default for SpecPipeline {
    fn default() -> Self {
        Self::standard()
    }
}
