use crate::config::StoreConfig;
use crate::errors::ServiceError;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Handle the data-dependent services hold: either a live connection pool
/// or the explicit knowledge that no store is configured. Decided once at
/// startup from [`StoreConfig`], never re-detected per call.
#[derive(Clone)]
pub enum StoreHandle {
    Live(Arc<DbPool>),
    Unconfigured,
}

impl StoreHandle {
    pub fn db(&self) -> Option<&DbPool> {
        match self {
            StoreHandle::Live(pool) => Some(pool),
            StoreHandle::Unconfigured => None,
        }
    }

    /// Connection for write paths, which must never silently no-op.
    pub fn db_for_write(&self) -> Result<&DbPool, ServiceError> {
        self.db().ok_or(ServiceError::StoreUnavailable)
    }
}

/// Establishes a connection pool against a configured store, or returns an
/// unconfigured handle without touching the network.
pub async fn connect(store: &StoreConfig) -> Result<StoreHandle, ServiceError> {
    match store {
        StoreConfig::Unconfigured => {
            warn!("No catalog store configured; running with mock-data fallback only");
            Ok(StoreHandle::Unconfigured)
        }
        StoreConfig::Configured { url } => {
            let mut options = ConnectOptions::new(url.clone());
            options
                .max_connections(10)
                .min_connections(1)
                .connect_timeout(Duration::from_secs(30))
                .idle_timeout(Duration::from_secs(600))
                .acquire_timeout(Duration::from_secs(8))
                .sqlx_logging(false);

            let pool = Database::connect(options).await?;
            info!("Connected to catalog store");
            Ok(StoreHandle::Live(Arc::new(pool)))
        }
    }
}

/// Applies pending migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    info!("Running database migrations");
    crate::migrator::Migrator::up(pool, None).await?;
    info!("Migrations complete");
    Ok(())
}
