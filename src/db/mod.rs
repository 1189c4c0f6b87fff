// Database module - survey store backed by SQLite

use std::str::FromStr;
use std::sync::Arc;

use color_eyre::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tokio::sync::{Mutex, MutexGuard};

pub mod error;
pub mod filter;
pub mod models;
pub mod ordering;
pub mod translation;

pub use error::{StoreResult, SurveyError};
pub use models::*;
pub use ordering::OrderedTable;
pub use translation::{LanguageId, Translation};

mod answer;
mod question;
mod question_group;
mod result;
mod schema;
mod statistic;
mod subject;
mod survey;

// Main database handle
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
    /// Held by every write. Order shifts of two requests never interleave and
    /// no transaction waits on another for the SQLite write lock.
    write_lock: Arc<Mutex<()>>,
}

impl Db {
    pub async fn new(url: String) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        // Verify connection
        let one: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&pool).await?;
        assert_eq!(one, 1);

        schema::create_schema(&pool).await?;

        tracing::info!("database connection has been verified");

        Ok(Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub(crate) async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }
}

/// `NotFound` unless `id` is a live row of `table`.
pub(crate) async fn ensure_live<'c, E>(
    executor: E,
    table: &'static str,
    entity: &'static str,
    id: i64,
) -> StoreResult<()>
where
    E: sqlx::SqliteExecutor<'c>,
{
    let exists: bool = sqlx::query_scalar(&format!(
        "SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ? AND deleted = 0)"
    ))
    .bind(id)
    .fetch_one(executor)
    .await?;

    if exists {
        Ok(())
    } else {
        Err(SurveyError::not_found(entity, id))
    }
}

/// Unix timestamp stored in the `deleted` tombstone columns.
pub(crate) fn tombstone() -> i64 {
    chrono::Utc::now().timestamp().max(1)
}
