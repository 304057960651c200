use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DbConn, DbErr};
use thiserror::Error;

/// Configuration for the primary database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Bounds both pool creation and the initial ping.
    pub connect_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("database did not respond within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Connect, verify the connection with a ping, and return the pool.
///
/// The whole handshake is bounded by `connect_timeout`.
pub async fn connect(config: &DatabaseConfig) -> Result<DbConn, ConnectError> {
    tracing::info!("Initializing database connection...");

    let opts = ConnectOptions::new(&config.url)
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.connect_timeout)
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(false)
        .to_owned();

    let handshake = async {
        let db = Database::connect(opts).await?;
        db.ping().await?;
        Ok::<_, DbErr>(db)
    };

    let db = tokio::time::timeout(config.connect_timeout, handshake)
        .await
        .map_err(|_| ConnectError::Timeout(config.connect_timeout))??;

    tracing::info!(
        backend = ?db.get_database_backend(),
        pool = config.max_connections,
        "Database connected"
    );
    Ok(db)
}
