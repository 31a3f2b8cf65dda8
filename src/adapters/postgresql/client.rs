//! PostgreSQL connection pool
//!
//! Wraps a deadpool pool configured from [`PostgreSQLConfig`], including the
//! TLS connector selected by `ssl_mode`.

use crate::config::PostgreSQLConfig;
use crate::domain::{EtlError, Result};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::config::SslMode;

/// Pooled PostgreSQL client
pub struct PostgreSQLClient {
    pool: Pool,
    config: PostgreSQLConfig,
}

/// Maps the configured `ssl_mode` onto the driver's modes
///
/// `allow` is treated as `prefer`; the `verify-*` modes require TLS and are
/// enforced by the connector.
pub fn driver_ssl_mode(ssl_mode: &str) -> SslMode {
    match ssl_mode {
        "disable" => SslMode::Disable,
        "require" | "verify-ca" | "verify-full" => SslMode::Require,
        _ => SslMode::Prefer,
    }
}

fn tls_connector(ssl_mode: &str) -> Result<MakeTlsConnector> {
    let mut builder = TlsConnector::builder();
    match ssl_mode {
        "verify-full" => {}
        "verify-ca" => {
            builder.danger_accept_invalid_hostnames(true);
        }
        _ => {
            builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }
    }
    let connector = builder
        .build()
        .map_err(|e| EtlError::Configuration(format!("Failed to build TLS connector: {}", e)))?;
    Ok(MakeTlsConnector::new(connector))
}

impl PostgreSQLClient {
    /// Creates the pool; no connection is opened until first use
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unparseable connection string.
    pub async fn new(config: PostgreSQLConfig) -> Result<Self> {
        let mut pg_config: tokio_postgres::Config = config
            .connection_string
            .expose_secret()
            .as_ref()
            .parse()
            .map_err(|e| {
                EtlError::Configuration(format!("Invalid PostgreSQL connection string: {}", e))
            })?;
        pg_config.ssl_mode(driver_ssl_mode(&config.ssl_mode));
        pg_config.connect_timeout(Duration::from_secs(config.connection_timeout_seconds));

        let manager = Manager::from_config(
            pg_config,
            tls_connector(&config.ssl_mode)?,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );

        let timeout = Some(Duration::from_secs(config.connection_timeout_seconds));
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .runtime(Runtime::Tokio1)
            .wait_timeout(timeout)
            .create_timeout(timeout)
            .recycle_timeout(timeout)
            .build()
            .map_err(|e| EtlError::Connection(format!("Failed to create connection pool: {}", e)))?;

        tracing::debug!(
            target = %Self::redact(&config),
            max_connections = config.max_connections,
            "PostgreSQL pool created"
        );
        Ok(Self { pool, config })
    }

    /// Runs `SELECT 1` on a pooled connection
    pub async fn test_connection(&self) -> Result<()> {
        let client = self.get_connection().await?;
        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| EtlError::Connection(format!("Connection test failed: {}", e)))?;

        tracing::info!(target = %self.connection_string_safe(), "PostgreSQL connection test successful");
        Ok(())
    }

    /// Takes a connection from the pool
    pub async fn get_connection(&self) -> Result<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            EtlError::Connection(format!("Failed to get connection from pool: {}", e))
        })
    }

    /// `SET LOCAL` statement applying the configured statement timeout
    pub fn statement_timeout_sql(&self) -> String {
        format!(
            "SET LOCAL statement_timeout = {}",
            self.config.statement_timeout_seconds * 1000
        )
    }

    /// Connection string with credentials removed
    pub fn connection_string_safe(&self) -> String {
        Self::redact(&self.config)
    }

    fn redact(config: &PostgreSQLConfig) -> String {
        config.connection_string.expose_secret().redacted_url()
    }
}
