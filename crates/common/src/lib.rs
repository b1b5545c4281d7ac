//! Shared utilities, configuration, and error handling for Regdesk
//!
//! This crate provides common functionality used across the Regdesk service:
//! - Configuration management following 12-factor principles
//! - Error types and the success/error response envelope
//! - Request extractors (validated JSON, pagination)
//! - Object storage URL construction

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod response;
pub mod state;
pub mod storage;

pub use config::Config;
pub use db::{is_unique_violation, RepositoryError};
pub use error::{Error, Result};
pub use extractors::{Pagination, ValidatedJson};
pub use response::ActionResponse;
pub use state::StateError;
pub use storage::StorageConfig;
