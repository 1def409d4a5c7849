//! kinship-core: family kinship graph engine.
//!
//! Models people and their typed kinship links within a family, keeps the
//! denormalized display caches consistent across mutations, and answers
//! "how are A and B related" with a culturally correct paired term.
//!
//! # Conventions
//!
//! - **Errors**: services return [`error::KinshipError`]; infrastructure
//!   helpers return `anyhow::Result` with context.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod authz;
pub mod config;
pub mod db;
pub mod error;
pub mod graph;
pub mod model;
pub mod service;
pub mod terms;

pub use authz::{AllowAll, Authorizer};
pub use config::EngineConfig;
pub use error::{ErrorCode, KinshipError};
pub use service::{DetectOutcome, Detection};
