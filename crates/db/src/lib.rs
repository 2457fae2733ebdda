pub mod models;
pub mod repositories;
pub mod schema;

use eyre::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use worship_core::errors::WorshipError;

pub type DbPool = Pool<Postgres>;

pub async fn create_pool(database_url: &str) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Wraps a driver error for workflows that return domain errors.
pub(crate) fn db_error(error: sqlx::Error) -> WorshipError {
    WorshipError::Database(error.into())
}

/// Maps a unique-constraint violation to a conflict, anything else to a
/// database error.
pub(crate) fn conflict_or_db(error: sqlx::Error, message: impl Into<String>) -> WorshipError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            WorshipError::Conflict(message.into())
        }
        _ => db_error(error),
    }
}
