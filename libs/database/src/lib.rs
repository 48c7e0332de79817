//! Database connectors configured through `confbuilder`.
//!
//! # Examples
//!
//! ```ignore
//! use database::postgres::{self, PostgresConfig};
//!
//! // DB_DSN, DB_LOG_LEVEL, DB_MAX_CONNECTIONS, ...
//! let config = PostgresConfig::from_env()?;
//! let db = postgres::connect(&config).await?;
//! ```

pub mod common;
pub mod postgres;

pub use common::{DatabaseError, DatabaseResult};
