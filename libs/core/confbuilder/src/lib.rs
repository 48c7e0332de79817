//! Layered, strongly-typed configuration.
//!
//! A configuration value is built from, in increasing precedence:
//!
//! 1. an in-memory default,
//! 2. an optional JSON file,
//! 3. environment variables, optionally seeded from `.env` files found in the
//!    working directory or any of its ancestors,
//!
//! and is then validated with [`validator`].
//!
//! Environment keys come from `#[tag(..)]` attributes read by
//! `#[derive(EnvConfig)]`. Nested structs join their segment to their
//! children's with `_`:
//!
//! ```ignore
//! use confbuilder::{Builder, EnvConfig};
//! use serde::{Deserialize, Serialize};
//! use validator::Validate;
//!
//! #[derive(Clone, Serialize, Deserialize, Validate, EnvConfig)]
//! pub struct DatabaseConfig {
//!     #[tag(env = "HOST")]
//!     pub host: String,
//! }
//!
//! #[derive(Clone, Serialize, Deserialize, Validate, EnvConfig)]
//! pub struct AppConfig {
//!     #[tag(env = "DB")]
//!     #[validate(nested)]
//!     pub database: DatabaseConfig,
//! }
//!
//! // APP_DB_HOST overrides `database.host`
//! let config = Builder::new(&defaults).env_prefix("APP_").build()?;
//! ```

extern crate self as confbuilder;

pub mod ancestors;
pub mod builder;
pub mod coerce;
pub mod environment;
pub mod error;
mod file;
pub mod level;
pub mod overlay;
pub mod tracing;

pub use builder::{Builder, DEFAULT_ENV_TAG};
pub use coerce::{FromEnvValue, parse_duration};
pub use environment::{Environment, ProcessEnv};
pub use error::{CoercionError, ConfigError, FieldError, Result};
pub use level::Level;
pub use overlay::{
    EnvConfig, EnvField, EnvKey, EnvPath, FieldDescriptor, FieldKind, JsonObject, Overlay, env_keys,
};

/// Derive [`EnvConfig`] for a struct with named fields.
///
/// Public fields may carry `#[tag(env = "SEGMENT")]`; private fields are
/// never touched. `#[tag(skip)]` leaves a public field out of the
/// environment walk, for types with no environment form such as maps.
///
/// JSON files are overlaid field by field using the serde names
/// (`rename_all`, `rename`); `#[serde(skip)]` fields are not read from a file.
pub use env_config::EnvConfig;
