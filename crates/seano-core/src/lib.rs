//! seano core - the release-notes query engine
//!
//! A seano database is a directory of per-change note files plus a
//! configuration file declaring project-level metadata. This crate provides
//! everything that works without a repository: schema normalization,
//! configuration loading, the data aggregator with its automatic/manual
//! precedence rules, the release-graph flattener, and the filesystem-backed
//! database. The repository-backed database lives in `seano-git`.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod schema;

pub use config::{find_database_root, Config};
pub use db::aggregator::{DataAggregator, Origin};
pub use db::generic::GenericDatabase;
pub use error::{ConfigError, Result, SchemaError, SeanoError};
