//! Core types and error handling for devstack
//!
//! This module holds the records every other layer speaks in:
//!
//! - [`Service`] and [`Builder`] - flat records loaded from `devstack.toml`
//! - [`DevstackError`] and [`ErrorContext`] - typed errors and their
//!   user-facing rendering
//!
//! The resolver and the assembly pipeline only ever read these records; they
//! are owned by the inventory that loaded them.

pub mod error;
mod service;

pub use error::{DevstackError, ErrorContext, user_friendly_error};
pub use service::{Builder, Service, find_service};
