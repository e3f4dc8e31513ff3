//! Warehouse access: connection scoping, migrations, bulk loads and reports.
//!
//! Every operation opens its own connection and releases it before
//! returning. Nothing is pooled or shared between requests.

pub mod loader;
pub mod reports;

use std::time::Duration;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement,
};
use sea_orm_migration::MigratorTrait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::config::WarehouseConfig;
use crate::error::{AppError, AppResult};
use crate::migration::Migrator;

pub use loader::LoadSummary;
pub use reports::parse_year;

/// Handle to the external warehouse.
///
/// Holds connection settings only; cloning it never opens a connection.
#[derive(Clone)]
pub struct Warehouse {
    database_url: SecretString,
    connect_timeout: Duration,
    max_rows_per_insert: usize,
}

impl Warehouse {
    /// Create a warehouse handle from configuration.
    pub fn new(config: &WarehouseConfig) -> Self {
        Self {
            database_url: config.database_url.clone(),
            connect_timeout: config.connect_timeout,
            max_rows_per_insert: config.max_rows_per_insert.max(1),
        }
    }

    /// Maximum rows per INSERT statement.
    pub fn max_rows_per_insert(&self) -> usize {
        self.max_rows_per_insert
    }

    /// Open a dedicated single-connection handle.
    ///
    /// Callers must hand the connection back through [`Warehouse::release`].
    pub async fn connect(&self) -> AppResult<DatabaseConnection> {
        let mut options = ConnectOptions::new(self.database_url.expose_secret().to_string());
        options
            .max_connections(1)
            .min_connections(0)
            .connect_timeout(self.connect_timeout)
            .sqlx_logging(false);

        let conn = Database::connect(options)
            .await
            .map_err(|e| AppError::Connection(format!("Failed to connect to warehouse: {}", e)))?;

        debug!("Warehouse connection opened");
        Ok(conn)
    }

    /// Close a connection obtained from [`Warehouse::connect`].
    pub async fn release(conn: DatabaseConnection) {
        match conn.close().await {
            Ok(()) => debug!("Warehouse connection closed"),
            Err(e) => warn!("Failed to close warehouse connection: {}", e),
        }
    }

    /// Verify the warehouse is reachable.
    pub async fn ping(&self) -> AppResult<()> {
        let conn = self.connect().await?;
        let stmt = Statement::from_string(DatabaseBackend::Postgres, "SELECT 1".to_owned());
        let result = conn
            .query_one_raw(stmt)
            .await
            .map(|_| ())
            .map_err(|e| AppError::Connection(format!("Warehouse ping failed: {}", e)));
        Self::release(conn).await;
        result
    }

    /// Create the destination tables if they do not exist.
    pub async fn run_migrations(&self) -> AppResult<()> {
        let conn = self.connect().await?;
        let result = Migrator::up(&conn, None)
            .await
            .map_err(|e| AppError::Database(format!("Failed to run migrations: {}", e)));
        Self::release(conn).await;
        result
    }
}

impl std::fmt::Debug for Warehouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Warehouse")
            .field("database_url", &"[REDACTED]")
            .field("connect_timeout", &self.connect_timeout)
            .field("max_rows_per_insert", &self.max_rows_per_insert)
            .finish()
    }
}

/// Quote an identifier for interpolation into SQL.
pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
