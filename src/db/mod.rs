mod from_row;
pub mod queries;
mod schema;

pub use schema::init_db;

use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::payload::PayloadIssuer;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state holding the database pool and the payload issuer.
///
/// The durable store is the only shared mutable resource; the issuer
/// carries the read-only signing secret and version defaults.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub issuer: PayloadIssuer,
    /// Trial window applied by StartTrial, in days.
    pub trial_days: i64,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path).with_init(|conn| {
        // Writers queue behind the IMMEDIATE transactions in queries.rs
        // instead of failing with SQLITE_BUSY.
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
    });
    Pool::builder().max_size(10).build(manager)
}
