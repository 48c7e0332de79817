//! PostgreSQL connector and configuration

mod config;
mod connector;

pub use config::PostgresConfig;
pub use connector::{connect, connect_with_options};

// Re-export SeaORM types for convenience
pub use sea_orm::{ConnectOptions, DatabaseConnection, DbErr};
