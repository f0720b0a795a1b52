//! Timeuh Machine Storage
//!
//! `SQLite` database layer for the broadcast history.
//!
//! # Architecture
//!
//! - **Vertical Slicing**: each feature owns its own queries (`tracks`,
//!   `highlights`)
//! - **Local time**: `started_at` is stored as the station's wall-clock time so
//!   archives group by the days listeners actually heard
//! - **Explicit refresh**: archive highlights are rebuilt on demand instead of
//!   on every insert
//!
//! # Example
//!
//! ```rust,no_run
//! use timeuh_storage::{SqliteTrackStore, create_pool, run_migrations};
//! use timeuh_core::storage::TrackStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Create database connection
//! let pool = create_pool("sqlite://timeuh.db").await?;
//! run_migrations(&pool).await?;
//!
//! let store = SqliteTrackStore::new(pool, 4);
//! let now = chrono::Local::now().naive_local();
//! let current = store.find_currently_playing(now).await?;
//! # Ok(())
//! # }
//! ```

mod context;
mod error;
mod period;

// Vertical slices
pub mod highlights;
pub mod tracks;

pub use context::SqliteTrackStore;
pub use error::StorageError;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// This should be called once when the application starts to ensure
/// the database schema is up to date.
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `<sqlite://timeuh.db>`)
///
/// # Errors
///
/// Returns an error if the connection fails
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    tracing::debug!(url = %database_url, "Creating SQLite pool");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    tracing::debug!("SQLite pool created");

    Ok(pool)
}
