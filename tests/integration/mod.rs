//! Integration test suite for devstack
//!
//! End-to-end tests that run the `devstack` binary against projects laid
//! out in temporary directories.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! - **list**: `list` output in table and JSON form
//! - **tree**: dependency and dependents trees
//! - **selection**: enable, disable, exclude, include and the state file
//! - **generate**: written compose files, dry runs and path rewriting
//! - **errors**: missing manifests, unknown services, bad fragments

#[path = "../common/mod.rs"]
mod common;

mod errors;
mod generate;
mod list;
mod selection;
mod tree;
