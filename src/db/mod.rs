//! SQLite persistence for users, riders, deliveries and their child records.
//!
//! Repositories are plain async functions taking the pool owned by
//! [`Database`]. Every statement binds its inputs as parameters.

pub mod deliveries;
pub mod delivery_images;
pub mod location_tracking;
pub mod multi_item_orders;
pub mod riders;
pub mod users;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::geo::GeoError;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Unknown phone number and wrong secret are reported identically.
    #[error("invalid phone number or password")]
    InvalidCredential,

    #[error("{entity} references a record that does not exist")]
    MissingReference { entity: &'static str },

    #[error(transparent)]
    Geometry(#[from] GeoError),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Maps a failed write, turning foreign key violations into `MissingReference`.
pub(crate) fn write_error(entity: &'static str) -> impl Fn(sqlx::Error) -> DbError {
    move |err| {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_foreign_key_violation() {
                return DbError::MissingReference { entity };
            }
        }
        DbError::Sqlx(err)
    }
}

#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connects to `url`, e.g. `sqlite:delivery.db?mode=rwc` or `sqlite::memory:`.
    ///
    /// An in-memory database is private to one connection, so callers using
    /// one should pass a pool size of 1.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size.max(1))
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(url, pool_size, "connected to database");

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("database migrations complete");
        Ok(())
    }

    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::test_db;
    use super::{write_error, DbError};

    #[test]
    fn non_constraint_write_errors_stay_sqlx_errors() {
        let err = write_error("Delivery")(sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::Sqlx(sqlx::Error::RowNotFound)));
    }

    #[tokio::test]
    async fn ping_succeeds_after_migration() {
        let db = test_db().await;
        db.ping().await.unwrap();
    }
}
