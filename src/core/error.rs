//! Error handling for devstack
//!
//! This module provides the error types and user-friendly error reporting used
//! throughout devstack. The error system follows two principles:
//! 1. **Strongly-typed errors** for precise handling in library code
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`DevstackError`] - Enumerated error types for all failure cases
//! - [`ErrorContext`] - Wrapper that adds suggestions and details for display
//!
//! Library code returns [`DevstackError`] (or [`anyhow::Error`] wrapping one)
//! and the CLI converts whatever reaches `main` with [`user_friendly_error`].
//!
//! # Error Categories
//!
//! - **Lookup**: [`DevstackError::ServiceNotFound`], [`DevstackError::BuilderNotFound`]
//! - **Configuration**: [`DevstackError::ManifestNotFound`], [`DevstackError::ManifestParseError`],
//!   [`DevstackError::FragmentParseError`], [`DevstackError::MalformedFragment`],
//!   [`DevstackError::ConfigError`] (global config)
//! - **Dependencies**: [`DevstackError::CircularDependency`]
//! - **Selectors**: [`DevstackError::InvalidSelector`]
//! - **File System**: [`DevstackError::FileSystemError`] (e.g. an output path
//!   that is a file), [`DevstackError::IoError`]
//!
//! Unresolvable dependency names and cycles are *not* errors for the tree
//! builder or the name resolver; they resolve to terminal leaves. The
//! variants above are raised by the surrounding layers (manifest loading,
//! generation, CLI lookups).
//!
//! # Examples
//!
//! ```rust,no_run
//! use devstack_cli::core::{DevstackError, ErrorContext};
//!
//! let context = ErrorContext::new(DevstackError::ManifestNotFound)
//!     .with_suggestion("Create a devstack.toml file in your project directory")
//!     .with_details("devstack searches for devstack.toml in current and parent directories");
//!
//! context.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for devstack operations
///
/// Each variant carries the names and paths needed to explain the failure to
/// an end user. Variants wrapping foreign errors (`IoError`, `TomlError`,
/// `YamlError`) are produced automatically through `?`.
#[derive(Error, Debug)]
pub enum DevstackError {
    /// A service name given by the user is not defined in the manifest
    #[error("Service '{name}' not found")]
    ServiceNotFound {
        /// Name of the service that was looked up
        name: String,
    },

    /// A service references a builder that is not defined in the manifest
    #[error("Builder '{name}' referenced by service '{service}' is not defined")]
    BuilderNotFound {
        /// Name of the missing builder
        name: String,
        /// Service that references it
        service: String,
    },

    /// Manifest file could not be located
    #[error("Manifest file devstack.toml not found in current directory or any parent directory")]
    ManifestNotFound,

    /// Manifest file exists but could not be parsed
    #[error("Invalid manifest file syntax in {file}")]
    ManifestParseError {
        /// Path of the manifest file
        file: String,
        /// Parser message
        reason: String,
    },

    /// Manifest parsed but violates a structural rule
    #[error("Manifest validation failed: {reason}")]
    ManifestValidationError {
        /// Description of the violation
        reason: String,
    },

    /// A compose fragment (service or builder file) could not be parsed
    #[error("Invalid configuration fragment in {file}")]
    FragmentParseError {
        /// Path of the fragment file
        file: String,
        /// Parser message
        reason: String,
    },

    /// A fragment has the wrong shape where the assembly pipeline needs to descend
    #[error("Malformed configuration for '{name}': {reason}")]
    MalformedFragment {
        /// Service or builder the fragment belongs to
        name: String,
        /// What was wrong with it
        reason: String,
    },

    /// A dependency cycle was found among the services
    #[error("Circular dependency detected: {chain}")]
    CircularDependency {
        /// Cycle rendered as `a → b → a`
        chain: String,
    },

    /// A dot-path selector string is malformed
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector {
        /// Selector as written
        selector: String,
        /// Why it was rejected
        reason: String,
    },

    /// Configuration file problem (global or project settings)
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem
        message: String,
    },

    /// File system operation failed
    #[error("File system error: {operation} failed for {path}")]
    FileSystemError {
        /// Operation that failed
        operation: String,
        /// Path involved
        path: String,
    },

    /// Standard I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    /// YAML parsing or serialization error
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Anything else
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl Clone for DevstackError {
    fn clone(&self) -> Self {
        match self {
            Self::ServiceNotFound {
                name,
            } => Self::ServiceNotFound {
                name: name.clone(),
            },
            Self::BuilderNotFound {
                name,
                service,
            } => Self::BuilderNotFound {
                name: name.clone(),
                service: service.clone(),
            },
            Self::ManifestNotFound => Self::ManifestNotFound,
            Self::ManifestParseError {
                file,
                reason,
            } => Self::ManifestParseError {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::ManifestValidationError {
                reason,
            } => Self::ManifestValidationError {
                reason: reason.clone(),
            },
            Self::FragmentParseError {
                file,
                reason,
            } => Self::FragmentParseError {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::MalformedFragment {
                name,
                reason,
            } => Self::MalformedFragment {
                name: name.clone(),
                reason: reason.clone(),
            },
            Self::CircularDependency {
                chain,
            } => Self::CircularDependency {
                chain: chain.clone(),
            },
            Self::InvalidSelector {
                selector,
                reason,
            } => Self::InvalidSelector {
                selector: selector.clone(),
                reason: reason.clone(),
            },
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            Self::FileSystemError {
                operation,
                path,
            } => Self::FileSystemError {
                operation: operation.clone(),
                path: path.clone(),
            },
            // Foreign errors don't implement Clone, keep their message
            Self::IoError(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::TomlError(e) => Self::Other {
                message: format!("TOML parsing error: {e}"),
            },
            Self::TomlSerError(e) => Self::Other {
                message: format!("TOML serialization error: {e}"),
            },
            Self::YamlError(e) => Self::Other {
                message: format!("YAML error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

impl DevstackError {
    /// Whether this error means a name did not resolve, as opposed to bad configuration.
    ///
    /// The CLI uses this to tell "service not found" apart from "malformed
    /// configuration" when rendering failures.
    #[must_use]
    pub const fn is_lookup_failure(&self) -> bool {
        matches!(self, Self::ServiceNotFound { .. } | Self::BuilderNotFound { .. })
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// When displayed, errors show the main message in red, optional details in
/// yellow and an optional suggestion in green.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: DevstackError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: DevstackError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`DevstackError`] anywhere in the `anyhow` chain, plain
/// [`std::io::Error`]s, and falls back to the full error chain as the message.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    // Already-built contexts pass through untouched
    if let Some(ctx) = error.downcast_ref::<ErrorContext>() {
        return ErrorContext {
            error: ctx.error.clone(),
            suggestion: ctx.suggestion.clone(),
            details: ctx.details.clone(),
        };
    }

    for cause in error.chain() {
        if let Some(devstack_error) = cause.downcast_ref::<DevstackError>() {
            return create_error_context(devstack_error.clone());
        }
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(DevstackError::FileSystemError {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Check file ownership and permissions of the project directory")
                .with_details(io_error.to_string());
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(DevstackError::FileSystemError {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct")
                .with_details(io_error.to_string());
            }
            _ => {}
        }
    }

    let message =
        error.chain().map(ToString::to_string).collect::<Vec<_>>().join("\n  Caused by: ");
    ErrorContext::new(DevstackError::Other {
        message,
    })
}

fn create_error_context(error: DevstackError) -> ErrorContext {
    match &error {
        DevstackError::ServiceNotFound {
            name,
        } => ErrorContext::new(error.clone())
            .with_suggestion("Run 'devstack list' to see the services defined in devstack.toml")
            .with_details(format!("No [services.{name}] table exists in the manifest")),
        DevstackError::BuilderNotFound {
            name,
            ..
        } => ErrorContext::new(error.clone())
            .with_suggestion(format!("Add a [builders.{name}] table to devstack.toml"))
            .with_details("Every builder named by a service must be declared in the manifest"),
        DevstackError::ManifestNotFound => ErrorContext::new(error)
            .with_suggestion("Create a devstack.toml file in your project directory")
            .with_details("devstack searches for devstack.toml in current and parent directories"),
        DevstackError::ManifestParseError {
            reason,
            ..
        }
        | DevstackError::FragmentParseError {
            reason,
            ..
        } => {
            let details = reason.clone();
            ErrorContext::new(error)
                .with_suggestion("Fix the syntax error reported above")
                .with_details(details)
        }
        DevstackError::MalformedFragment {
            ..
        } => ErrorContext::new(error)
            .with_details("This is a configuration problem, not a missing service"),
        DevstackError::CircularDependency {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Remove one of the depends-on entries that closes the cycle"),
        DevstackError::InvalidSelector {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Selectors look like '.build.args': a leading dot, then names"),
        DevstackError::ConfigError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion(format!(
                "Fix the global config or point {} at another file",
                crate::config::CONFIG_PATH_ENV
            )),
        DevstackError::FileSystemError {
            path,
            ..
        } => {
            let details = format!("Remove or rename {path} if it is not meant to be there");
            ErrorContext::new(error)
                .with_suggestion("Check the output and state directory settings")
                .with_details(details)
        }
        _ => ErrorContext::new(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = DevstackError::ServiceNotFound {
            name: "api".to_string(),
        };
        assert_eq!(error.to_string(), "Service 'api' not found");

        let error = DevstackError::CircularDependency {
            chain: "a → b → a".to_string(),
        };
        assert_eq!(error.to_string(), "Circular dependency detected: a → b → a");
    }

    #[test]
    fn test_error_context_display() {
        let ctx = ErrorContext::new(DevstackError::ManifestNotFound)
            .with_suggestion("create it")
            .with_details("looked everywhere");
        let rendered = ctx.to_string();
        assert!(rendered.contains("devstack.toml not found"));
        assert!(rendered.contains("Details: looked everywhere"));
        assert!(rendered.contains("Suggestion: create it"));
    }

    #[test]
    fn test_user_friendly_error_finds_wrapped_error() {
        let error = anyhow::Error::from(DevstackError::ServiceNotFound {
            name: "db".to_string(),
        })
        .context("Failed to build tree");

        let ctx = user_friendly_error(error);
        assert!(matches!(ctx.error, DevstackError::ServiceNotFound { .. }));
        assert!(ctx.suggestion.unwrap().contains("devstack list"));
    }

    #[test]
    fn test_lookup_failure_vs_malformed() {
        assert!(
            DevstackError::ServiceNotFound {
                name: "x".into()
            }
            .is_lookup_failure()
        );
        assert!(
            !DevstackError::MalformedFragment {
                name: "x".into(),
                reason: "y".into()
            }
            .is_lookup_failure()
        );
    }

    #[test]
    fn test_clone_foreign_error_keeps_message() {
        let io = std::io::Error::other("disk on fire");
        let cloned = DevstackError::from(io).clone();
        assert!(cloned.to_string().contains("disk on fire"));
    }

    #[test]
    fn test_config_and_file_system_errors_get_suggestions() {
        let error = anyhow::Error::from(DevstackError::ConfigError {
            message: "bad value".to_string(),
        })
        .context("Failed to load project");
        let ctx = user_friendly_error(error);
        assert!(matches!(ctx.error, DevstackError::ConfigError { .. }));
        assert!(ctx.suggestion.unwrap().contains("DEVSTACK_CONFIG"));

        let error = DevstackError::FileSystemError {
            operation: "create directory".to_string(),
            path: "/p/local".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "File system error: create directory failed for /p/local"
        );
        let ctx = user_friendly_error(error.into());
        assert!(ctx.details.unwrap().contains("/p/local"));
    }

    #[test]
    fn test_generic_error_keeps_chain() {
        let error = anyhow::anyhow!("root cause").context("outer");
        let ctx = user_friendly_error(error);
        let rendered = ctx.error.to_string();
        assert!(rendered.contains("outer"));
        assert!(rendered.contains("root cause"));
    }
}
