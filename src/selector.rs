//! Dot-path selectors for addressing fields inside YAML documents.
//!
//! A selector such as `.build.args` is parsed once into a list of field names
//! and then used for reads and writes without re-parsing. Malformed
//! selectors are rejected at construction, so a [`Selector`] value is always
//! valid.
//!
//! # Syntax
//!
//! - a leading `.` followed by one or more `.`-separated field names
//! - field names consist of ASCII letters, digits, `_` and `-`
//! - `.` on its own addresses the document root
//!
//! ```rust
//! use devstack_cli::selector::Selector;
//! use serde_yaml::Value;
//!
//! let doc: Value = serde_yaml::from_str("build: {args: {NODE_ENV: dev}}").unwrap();
//! let args = Selector::parse(".build.args").unwrap();
//! assert_eq!(args.get(&doc).unwrap()["NODE_ENV"], Value::from("dev"));
//!
//! assert!(Selector::parse("build.args").is_err());
//! assert!(Selector::parse(".build..args").is_err());
//! ```

use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::core::DevstackError;

static FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+$").unwrap_or_else(|e| panic!("invalid field pattern: {e}"))
});

/// A parsed, validated dot-path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    fields: Vec<String>,
}

impl Selector {
    /// Parse a selector, rejecting malformed syntax.
    pub fn parse(input: &str) -> Result<Self, DevstackError> {
        let invalid = |reason: &str| DevstackError::InvalidSelector {
            selector: input.to_string(),
            reason: reason.to_string(),
        };

        let Some(rest) = input.strip_prefix('.') else {
            return Err(invalid("must start with '.'"));
        };

        if rest.is_empty() {
            return Ok(Self::root());
        }

        let mut fields = Vec::new();
        for field in rest.split('.') {
            if field.is_empty() {
                return Err(invalid("empty field name"));
            }
            if !FIELD.is_match(field) {
                return Err(invalid(&format!("'{field}' contains characters outside [A-Za-z0-9_-]")));
            }
            fields.push(field.to_string());
        }

        Ok(Self {
            fields,
        })
    }

    /// The selector addressing the whole document.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            fields: Vec::new(),
        }
    }

    /// Selector for a single top-level field, bypassing syntax checks.
    ///
    /// Used for service names, which may contain characters selectors don't allow.
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            fields: vec![name.into()],
        }
    }

    /// Extend the selector by one field.
    #[must_use]
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut fields = self.fields.clone();
        fields.push(name.into());
        Self {
            fields,
        }
    }

    /// The parsed field names.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Whether this addresses the document root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.fields.is_empty()
    }

    /// Read the addressed value. `None` when any step is missing or not a mapping.
    #[must_use]
    pub fn get<'v>(&self, doc: &'v Value) -> Option<&'v Value> {
        self.fields.iter().try_fold(doc, |current, field| current.as_mapping()?.get(field.as_str()))
    }

    /// Read the addressed value from a mapping root.
    #[must_use]
    pub fn get_in<'v>(&self, map: &'v Mapping) -> Option<&'v Value> {
        let (first, rest) = self.fields.split_first()?;
        let start = map.get(first.as_str())?;
        rest.iter().try_fold(start, |current, field| current.as_mapping()?.get(field.as_str()))
    }

    /// Write `value` at the addressed location of a mapping root, creating
    /// intermediate mappings as needed.
    ///
    /// Fails with [`DevstackError::MalformedFragment`] when an intermediate
    /// value exists but is not a mapping. Writing the root selector is a
    /// no-op unless `value` is itself a mapping, which then replaces `map`.
    pub fn set_in(&self, map: &mut Mapping, value: Value) -> Result<(), DevstackError> {
        let Some((last, parents)) = self.fields.split_last() else {
            if let Value::Mapping(replacement) = value {
                *map = replacement;
            }
            return Ok(());
        };

        let mut current = map;
        for field in parents {
            let entry = current
                .entry(Value::String(field.clone()))
                .or_insert_with(|| Value::Mapping(Mapping::new()));
            current = entry.as_mapping_mut().ok_or_else(|| DevstackError::MalformedFragment {
                name: self.to_string(),
                reason: format!("'{field}' is not a mapping"),
            })?;
        }

        current.insert(Value::String(last.clone()), value);
        Ok(())
    }

    /// Remove and return the addressed value from a mapping root.
    pub fn remove_in(&self, map: &mut Mapping) -> Option<Value> {
        let (last, parents) = self.fields.split_last()?;
        let mut current = map;
        for field in parents {
            current = current.get_mut(field.as_str())?.as_mapping_mut()?;
        }
        current.remove(last.as_str())
    }
}

impl FromStr for Selector {
    type Err = DevstackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fields.is_empty() {
            return f.write_str(".");
        }
        for field in &self.fields {
            write!(f, ".{field}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_parse_valid() {
        let sel = Selector::parse(".build.args").unwrap();
        assert_eq!(sel.fields(), ["build", "args"]);
        assert_eq!(sel.to_string(), ".build.args");

        let root = Selector::parse(".").unwrap();
        assert!(root.is_root());
        assert_eq!(root.to_string(), ".");

        let dashed: Selector = ".x-devstack.depends_on".parse().unwrap();
        assert_eq!(dashed.fields(), ["x-devstack", "depends_on"]);
    }

    #[test]
    fn test_parse_invalid() {
        for bad in ["", "build", "build.args", ".build..args", ".build.", "..", ".a b", ".a.$"] {
            let err = Selector::parse(bad).unwrap_err();
            assert!(
                matches!(err, DevstackError::InvalidSelector { .. }),
                "expected rejection of {bad:?}"
            );
        }
    }

    #[test]
    fn test_get() {
        let d = doc("build: {context: ., args: {A: '1'}}\nimage: node");
        assert_eq!(Selector::parse(".image").unwrap().get(&d), Some(&Value::from("node")));
        assert_eq!(Selector::parse(".build.args.A").unwrap().get(&d), Some(&Value::from("1")));
        assert!(Selector::parse(".build.missing").unwrap().get(&d).is_none());
        // Descending through a scalar is a miss, not an error
        assert!(Selector::parse(".image.tag").unwrap().get(&d).is_none());
        assert_eq!(Selector::root().get(&d), Some(&d));
    }

    #[test]
    fn test_set_creates_intermediate_mappings() {
        let mut map = Mapping::new();
        Selector::parse(".build.args").unwrap().set_in(&mut map, doc("{A: b}")).unwrap();

        assert_eq!(Value::Mapping(map), doc("build: {args: {A: b}}"));
    }

    #[test]
    fn test_set_through_scalar_fails() {
        let mut map = doc("build: ./context").as_mapping().unwrap().clone();
        let err = Selector::parse(".build.args").unwrap().set_in(&mut map, Value::Null).unwrap_err();
        assert!(matches!(err, DevstackError::MalformedFragment { .. }));
    }

    #[test]
    fn test_get_in_and_remove_in() {
        let mut map = doc("build: {context: ., args: {A: '1'}}").as_mapping().unwrap().clone();
        let sel = Selector::parse(".build.args").unwrap();

        assert!(sel.get_in(&map).is_some());
        assert_eq!(sel.remove_in(&mut map), Some(doc("{A: '1'}")));
        assert!(sel.get_in(&map).is_none());
        assert_eq!(Value::Mapping(map), doc("build: {context: .}"));
    }

    #[test]
    fn test_field_allows_any_name() {
        let d = doc("services: {'my.svc': {image: x}}");
        let sel = Selector::field("services").child("my.svc").child("image");
        assert_eq!(sel.get(&d), Some(&Value::from("x")));
    }
}
