use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::{debug, info};

use super::PostgresConfig;
use crate::common::{DatabaseError, DatabaseResult};

/// Open a connection pool described by `config`.
///
/// A single attempt is made; failures are reported as
/// [`DatabaseError::Connection`].
///
/// # Example
/// ```ignore
/// use database::postgres::{PostgresConfig, connect};
///
/// let config = PostgresConfig::from_env()?;
/// let db = connect(&config).await?;
/// ```
pub async fn connect(config: &PostgresConfig) -> DatabaseResult<DatabaseConnection> {
    debug!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        log_level = %config.log_level,
        "Opening PostgreSQL connection pool"
    );
    connect_with_options(config.clone().into_connect_options()).await
}

/// Connect with custom connection options
pub async fn connect_with_options(options: ConnectOptions) -> DatabaseResult<DatabaseConnection> {
    let db = Database::connect(options)
        .await
        .map_err(DatabaseError::Connection)?;
    info!("Successfully connected to PostgreSQL database");
    Ok(db)
}
