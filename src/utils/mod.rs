//! Filesystem and path utilities
//!
//! - [`fs`] - atomic writes, project discovery and typed file I/O
//! - [`paths`] - lexical path relativization for fragments that change directory

pub mod fs;
pub mod paths;

pub use fs::{atomic_write, ensure_dir, find_project_root, safe_write};
pub use paths::{relativize, relativize_all, relativize_value};
