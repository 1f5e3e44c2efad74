use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::debug;

use crate::error::AppError;

#[cfg(test)]
pub(crate) mod memory;
mod migrations;
mod models;
mod repository;
mod store;

pub use migrations::run_migrations;
pub use models::{MatchRecord, ParticipantStat, TrackedEntity, WinLoss};
pub use repository::Repository;
pub use store::{MatchStore, ParticipantStore, StoreError, StoreResult, TrackedEntityStore};

/// Open the SQLite pool, creating the database file if needed.
pub async fn connect(database_url: &str) -> Result<SqlitePool, AppError> {
    debug!(database_url, "🗄️ Opening database connection...");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Fresh migrated in-memory database.
///
/// One connection only: every new connection to `:memory:` is its own database.
#[cfg(test)]
pub(crate) async fn memory_repository() -> Repository {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();
    Repository::new(pool)
}
