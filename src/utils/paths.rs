//! Path relativization for fragments that move between directories.
//!
//! Compose files resolve relative paths (`env_file`, `build.context`, ...)
//! against the directory of the file they are written in. When a fragment is
//! copied from `services/modules/module-a/api.docker-compose.yaml` into
//! `local/api/docker-compose.yaml`, every such path has to be rewritten so it
//! still points at the same place. [`relativize`] does that rewrite.
//!
//! All functions here are lexical: they never touch the filesystem, never
//! follow symlinks and never consult the current directory.
//!
//! # Invariant
//!
//! For any relative `p`:
//!
//! ```text
//! clean(dest / relativize(p, src, dest)) == clean(dirname(src) / p)
//! ```
//!
//! Absolute paths are returned unchanged, which trivially satisfies the same
//! equation.
//!
//! # Examples
//!
//! ```rust
//! use devstack_cli::utils::paths::relativize;
//!
//! let moved = relativize(
//!     "my-env.env",
//!     "/P/services/modules/module-a/service-f.docker-compose.yaml",
//!     "/P/local/service-f/",
//! );
//! assert_eq!(moved, "../../services/modules/module-a/my-env.env");
//! ```

use serde_yaml::Value;
use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path, resolving `.` and `..` components.
///
/// Unlike a naive component pop, leading `..` components of a relative path
/// are kept (`../a/../../b` becomes `../../b`), and `..` directly under the
/// root of an absolute path is dropped (`/..` is `/`).
#[must_use]
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            c => out.push(c),
        }
    }

    out.iter().collect()
}

/// Relative path that leads from directory `from` to directory `to`.
///
/// Both arguments are cleaned first. When only `to` is absolute there is no
/// lexical answer, so `to` itself is returned; resolving an absolute path
/// from anywhere yields itself. Identical directories give an empty path.
///
/// `from` must not begin with `..` once cleaned: the directories it climbs
/// out of are unknown, so no `..` count can step back into them. Callers
/// pass absolute paths; the generator works from an absolute project root.
#[must_use]
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from = clean_path(from);
    let to = clean_path(to);

    if from.is_absolute() != to.is_absolute() {
        tracing::debug!(
            "Cannot relate {} to {} lexically, keeping target as is",
            from.display(),
            to.display()
        );
        return to;
    }
    if from.components().next() == Some(Component::ParentDir) {
        tracing::debug!("Relating from {}, which climbs above its base", from.display());
    }

    let from_parts: Vec<Component<'_>> = from.components().collect();
    let to_parts: Vec<Component<'_>> = to.components().collect();

    let common = from_parts.iter().zip(&to_parts).take_while(|(a, b)| a == b).count();

    let mut result = PathBuf::new();
    for _ in common..from_parts.len() {
        result.push("..");
    }
    for part in &to_parts[common..] {
        result.push(part.as_os_str());
    }
    result
}

/// Render a path with `/` separators, as compose files expect on every platform.
#[must_use]
pub fn to_slash(path: &Path) -> String {
    let mut parts = Vec::new();
    let mut rooted = false;

    for component in path.components() {
        match component {
            Component::RootDir => rooted = true,
            Component::Prefix(prefix) => parts.push(prefix.as_os_str().to_string_lossy()),
            Component::CurDir => parts.push(".".into()),
            Component::ParentDir => parts.push("..".into()),
            Component::Normal(part) => parts.push(part.to_string_lossy()),
        }
    }

    let joined = parts.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Rewrite `path`, written relative to `source_file`'s directory, so that it
/// resolves to the same location from `destination_dir`.
///
/// Absolute paths are returned unchanged.
#[must_use]
pub fn relativize(
    path: &str,
    source_file: impl AsRef<Path>,
    destination_dir: impl AsRef<Path>,
) -> String {
    if Path::new(path).is_absolute() {
        return path.to_string();
    }

    let source_dir = source_file.as_ref().parent().unwrap_or_else(|| Path::new(""));
    let base = relative_path(destination_dir.as_ref(), source_dir);
    to_slash(&clean_path(&base.join(path)))
}

/// [`relativize`] applied element-wise; output has the same length and order.
#[must_use]
pub fn relativize_all<S: AsRef<str>>(
    paths: &[S],
    source_file: impl AsRef<Path>,
    destination_dir: impl AsRef<Path>,
) -> Vec<String> {
    let source_file = source_file.as_ref();
    let destination_dir = destination_dir.as_ref();
    paths.iter().map(|p| relativize(p.as_ref(), source_file, destination_dir)).collect()
}

/// [`relativize`] over a YAML value, mirroring its shape.
///
/// - a string is rewritten
/// - a sequence is rewritten element-wise
/// - a mapping with a string `path` key (compose long syntax, e.g.
///   `env_file: [{path: x.env, required: false}]`) has that key rewritten
/// - anything else is returned unchanged
#[must_use]
pub fn relativize_value(
    value: &Value,
    source_file: impl AsRef<Path>,
    destination_dir: impl AsRef<Path>,
) -> Value {
    let source_file = source_file.as_ref();
    let destination_dir = destination_dir.as_ref();

    match value {
        Value::String(path) => Value::String(relativize(path, source_file, destination_dir)),
        Value::Sequence(items) => Value::Sequence(
            items.iter().map(|item| relativize_value(item, source_file, destination_dir)).collect(),
        ),
        Value::Mapping(map) => {
            let mut map = map.clone();
            if let Some(Value::String(path)) = map.get_mut("path") {
                *path = relativize(path, source_file, destination_dir);
            }
            Value::Mapping(map)
        }
        other => other.clone(),
    }
}
