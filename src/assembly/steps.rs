//! The standard assembly steps.

use serde_yaml::{Mapping, Sequence, Value};
use std::path::Path;

use super::{AssemblyContext, AssemblyStep};
use crate::core::DevstackError;
use crate::selector::Selector;
use crate::utils::paths::{relativize, relativize_value};

/// Run-configuration fields taken from the builder template.
pub const BUILDER_FIELDS: [&str; 4] = ["command", "entrypoint", "working_dir", "user"];

/// Fields copied wholesale from the service fragment.
pub const VERBATIM_FIELDS: [&str; 5] = ["environment", "labels", "networks", "image", "healthcheck"];

fn selector(field: &str) -> Selector {
    Selector::field(field)
}

/// Normalize `build` to its long form. The short form `build: ./dir` is the context.
fn build_section(fragment: &Mapping) -> Option<Mapping> {
    match fragment.get("build")? {
        Value::Mapping(map) => Some(map.clone()),
        Value::String(context) => {
            let mut map = Mapping::new();
            map.insert(Value::from("context"), Value::String(context.clone()));
            Some(map)
        }
        _ => None,
    }
}

/// Copies `build` (minus `args`) and the [`BUILDER_FIELDS`] from the builder
/// template, with the service fragment's values taking precedence.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuilderStep;

impl BuilderStep {
    fn merge_build(
        into: &mut Mapping,
        fragment: &Mapping,
        source: &Path,
        destination: &Path,
    ) {
        let Some(build) = build_section(fragment) else {
            return;
        };
        for (key, value) in build {
            if key.as_str() == Some("args") {
                continue;
            }
            let value = match value {
                Value::String(context) if key.as_str() == Some("context") => {
                    Value::String(relativize(&context, source, destination))
                }
                other => other,
            };
            into.insert(key, value);
        }
    }
}

impl AssemblyStep for BuilderStep {
    fn name(&self) -> &str {
        "builder"
    }

    fn targets(&self) -> Vec<Selector> {
        let mut targets = vec![selector("build")];
        targets.extend(BUILDER_FIELDS.iter().map(|f| selector(f)));
        targets
    }

    fn apply(&self, output: &mut Mapping, ctx: &AssemblyContext<'_>) -> Result<(), DevstackError> {
        let service = ctx.service_fragment()?;
        let builder = ctx.builder_fragment()?;
        let service_source = ctx.service_source();

        let mut build = Mapping::new();
        if let (Some(template), Some(source)) = (builder, ctx.builder_source()) {
            Self::merge_build(&mut build, template, &source, ctx.destination_dir);
        }
        if let Some(fragment) = service {
            Self::merge_build(&mut build, fragment, &service_source, ctx.destination_dir);
        }
        if !build.is_empty() {
            output.insert(Value::from("build"), Value::Mapping(build));
        }

        for field in BUILDER_FIELDS {
            let value = service
                .and_then(|f| f.get(field))
                .or_else(|| builder.and_then(|b| b.get(field)));
            if let Some(value) = value {
                output.insert(Value::from(field), value.clone());
            }
        }

        Ok(())
    }
}

/// Writes the service record's `depends_on` names.
///
/// Names outside the generated set are dropped; compose refuses to start a
/// service whose dependency is not defined.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependsOnStep;

impl AssemblyStep for DependsOnStep {
    fn name(&self) -> &str {
        "depends-on"
    }

    fn targets(&self) -> Vec<Selector> {
        vec![selector("depends_on")]
    }

    fn apply(&self, output: &mut Mapping, ctx: &AssemblyContext<'_>) -> Result<(), DevstackError> {
        let mut names = Sequence::new();
        for dependency in &ctx.service.depends_on {
            if ctx.is_selected(dependency) {
                names.push(Value::from(dependency.as_str()));
            } else {
                tracing::debug!(
                    "Dropping '{dependency}' from depends_on of '{}': not generated",
                    ctx.service.name
                );
            }
        }
        if names.is_empty() {
            return Ok(());
        }
        output.insert(Value::from("depends_on"), Value::Sequence(names));
        Ok(())
    }
}

/// Appends `value` to `out` as list entries; a scalar or mapping is one entry.
fn push_entries(out: &mut Sequence, value: Value) {
    match value {
        Value::Sequence(items) => out.extend(items),
        Value::Null => {}
        other => out.push(other),
    }
}

/// Collects `env_file` from the builder and then the service, each entry
/// relativized from the file it came from.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvFileStep;

impl AssemblyStep for EnvFileStep {
    fn name(&self) -> &str {
        "env-file"
    }

    fn targets(&self) -> Vec<Selector> {
        vec![selector("env_file")]
    }

    fn apply(&self, output: &mut Mapping, ctx: &AssemblyContext<'_>) -> Result<(), DevstackError> {
        let mut entries = Sequence::new();

        if let (Some(template), Some(source)) = (ctx.builder_fragment()?, ctx.builder_source())
            && let Some(env_file) = template.get("env_file")
        {
            push_entries(&mut entries, relativize_value(env_file, &source, ctx.destination_dir));
        }
        if let Some(fragment) = ctx.service_fragment()?
            && let Some(env_file) = fragment.get("env_file")
        {
            push_entries(
                &mut entries,
                relativize_value(env_file, ctx.service_source(), ctx.destination_dir),
            );
        }

        if !entries.is_empty() {
            output.insert(Value::from("env_file"), Value::Sequence(entries));
        }
        Ok(())
    }
}

/// Whether a bind-mount source needs rewriting: relative paths only.
///
/// Named volumes (`data:/var/lib/x`) and absolute paths are left alone.
fn is_relative_mount(source: &str) -> bool {
    source == "." || source == ".." || source.starts_with("./") || source.starts_with("../")
}

/// Relativize a bind-mount source, keeping it recognisable as a path.
fn relativize_mount(host: &str, source_file: &Path, destination: &Path) -> String {
    let moved = relativize(host, source_file, destination);
    if is_relative_mount(&moved) || Path::new(&moved).is_absolute() {
        moved
    } else {
        format!("./{moved}")
    }
}

fn relativize_volume(volume: &Value, source_file: &Path, destination: &Path) -> Value {
    match volume {
        Value::String(spec) => {
            let (host, rest) = match spec.split_once(':') {
                Some((host, rest)) => (host, Some(rest)),
                None => (spec.as_str(), None),
            };
            if !is_relative_mount(host) {
                return volume.clone();
            }
            let host = relativize_mount(host, source_file, destination);
            Value::String(match rest {
                Some(rest) => format!("{host}:{rest}"),
                None => host,
            })
        }
        Value::Mapping(map) => {
            let mut map = map.clone();
            if let Some(Value::String(src)) = map.get_mut("source")
                && is_relative_mount(src)
            {
                *src = relativize_mount(src, source_file, destination);
            }
            Value::Mapping(map)
        }
        other => other.clone(),
    }
}

/// Collects `volumes` from the builder and then the service, rewriting
/// relative bind mounts.
#[derive(Debug, Clone, Copy, Default)]
pub struct VolumesStep;

impl AssemblyStep for VolumesStep {
    fn name(&self) -> &str {
        "volumes"
    }

    fn targets(&self) -> Vec<Selector> {
        vec![selector("volumes")]
    }

    fn apply(&self, output: &mut Mapping, ctx: &AssemblyContext<'_>) -> Result<(), DevstackError> {
        let mut volumes = Sequence::new();
        let mut collect = |fragment: &Mapping, source: &Path| {
            if let Some(Value::Sequence(items)) = fragment.get("volumes") {
                volumes.extend(
                    items.iter().map(|v| relativize_volume(v, source, ctx.destination_dir)),
                );
            }
        };

        if let (Some(template), Some(source)) = (ctx.builder_fragment()?, ctx.builder_source()) {
            collect(template, source.as_path());
        }
        if let Some(fragment) = ctx.service_fragment()? {
            collect(fragment, ctx.service_source().as_path());
        }

        if !volumes.is_empty() {
            output.insert(Value::from("volumes"), Value::Sequence(volumes));
        }
        Ok(())
    }
}

/// Copies one field of the service fragment unchanged.
#[derive(Debug, Clone)]
pub struct VerbatimStep {
    field: String,
}

impl VerbatimStep {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl AssemblyStep for VerbatimStep {
    fn name(&self) -> &str {
        &self.field
    }

    fn targets(&self) -> Vec<Selector> {
        vec![selector(&self.field)]
    }

    fn apply(&self, output: &mut Mapping, ctx: &AssemblyContext<'_>) -> Result<(), DevstackError> {
        if let Some(value) = ctx.service_fragment()?.and_then(|f| f.get(self.field.as_str())) {
            output.insert(Value::from(self.field.as_str()), value.clone());
        }
        Ok(())
    }
}

/// Read `build.args` in either compose form into a mapping.
///
/// `["KEY=VALUE", "BARE"]` becomes `{KEY: VALUE, BARE: null}`.
fn build_args(fragment: &Mapping) -> Mapping {
    let mut args = Mapping::new();
    let Some(Value::Mapping(build)) = fragment.get("build") else {
        return args;
    };

    match build.get("args") {
        Some(Value::Mapping(map)) => args.extend(map.clone()),
        Some(Value::Sequence(items)) => {
            for item in items.iter().filter_map(Value::as_str) {
                match item.split_once('=') {
                    Some((key, value)) => {
                        args.insert(Value::from(key), Value::from(value));
                    }
                    None => {
                        args.insert(Value::from(item), Value::Null);
                    }
                }
            }
        }
        _ => {}
    }
    args
}

/// Merges `build.args` of the builder and the service; the service wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildArgsStep;

impl AssemblyStep for BuildArgsStep {
    fn name(&self) -> &str {
        "build-args"
    }

    fn targets(&self) -> Vec<Selector> {
        vec![selector("build").child("args")]
    }

    fn apply(&self, output: &mut Mapping, ctx: &AssemblyContext<'_>) -> Result<(), DevstackError> {
        let mut args = ctx.builder_fragment()?.map(build_args).unwrap_or_default();
        if let Some(fragment) = ctx.service_fragment()? {
            for (key, value) in build_args(fragment) {
                args.insert(key, value);
            }
        }

        if args.is_empty() {
            return Ok(());
        }
        selector("build").child("args").set_in(output, Value::Mapping(args))
    }
}

/// Copies every service-fragment key that no other step writes.
#[derive(Debug, Clone, Default)]
pub struct PassThroughStep {
    reserved: Vec<String>,
}

impl PassThroughStep {
    pub fn new(reserved: Vec<String>) -> Self {
        Self {
            reserved,
        }
    }

    #[must_use]
    pub fn reserved(&self) -> &[String] {
        &self.reserved
    }
}

impl AssemblyStep for PassThroughStep {
    fn name(&self) -> &str {
        "pass-through"
    }

    fn targets(&self) -> Vec<Selector> {
        Vec::new()
    }

    fn apply(&self, output: &mut Mapping, ctx: &AssemblyContext<'_>) -> Result<(), DevstackError> {
        let Some(fragment) = ctx.service_fragment()? else {
            return Ok(());
        };

        for (key, value) in fragment {
            let owned = key.as_str().is_some_and(|k| self.reserved.iter().any(|r| r == k));
            if !owned {
                output.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }
}
