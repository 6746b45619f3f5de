//! devstack - modular local development environments
//!
//! A project lists its services in `devstack.toml`, each pointing at a
//! docker-compose fragment. devstack resolves the services you enable
//! together with everything they transitively depend on, then assembles one
//! compose file per service with paths rewritten for the output directory.
//!
//! # Manifest (devstack.toml)
//!
//! ```toml
//! [settings]
//! output-dir = "local"
//!
//! [builders.node]
//! source = "builders/node.docker-compose.yaml"
//!
//! [services.api]
//! source = "services/modules/backend/api.docker-compose.yaml"
//! builder = "node"
//! depends-on = ["db", "cache"]
//! module = "backend"
//!
//! [services.db]
//! source = "services/db.docker-compose.yaml"
//! ```
//!
//! # Modules
//!
//! - [`inventory`] - loading the manifest into [`core::Service`] records
//! - [`resolver`] - dependency trees, transitive lists, cycle reports
//! - [`selector`] - dotted paths into YAML documents
//! - [`assembly`] - the step pipeline that builds one service's compose entry
//! - [`generator`] - writing per-service and aggregate compose files
//! - [`state`] - the persisted selection of enabled services
//! - [`scheduler`] - deferred tasks gated on dependencies and delays
//! - [`config`] - global and project settings
//! - [`cli`] - the `devstack` command
//! - [`utils`] - filesystem and path helpers

pub mod assembly;
pub mod cli;
pub mod config;
pub mod core;
pub mod generator;
pub mod inventory;
pub mod resolver;
pub mod scheduler;
pub mod selector;
pub mod state;
pub mod utils;

// Available to unit tests and, through the test-utils feature, integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
