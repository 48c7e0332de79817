use confbuilder::ConfigError;

/// Unified database error type
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Opening the connection pool failed
    #[error("failed to connect to database: {0}")]
    Connection(#[source] sea_orm::DbErr),

    /// Loading or validating the connection settings failed
    #[error("invalid database configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;
