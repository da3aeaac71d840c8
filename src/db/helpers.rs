// src/db/helpers.rs

use crate::db::Database;
use crate::error::AppError;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Execute a database operation with proper lock handling and error logging.
///
/// # Example
/// ```ignore
/// with_connection(&db, "load cache entry", |conn| {
///     CategoryCacheEntry::find(conn, "example.com")
/// })
/// ```
pub fn with_connection<F, T>(db: &Arc<Mutex<Database>>, operation: &str, f: F) -> Result<T, AppError>
where
    F: FnOnce(&Connection) -> Result<T, AppError>,
{
    let db = db.lock().map_err(|e| {
        log::error!("Failed to acquire database lock to {operation}: {e}");
        AppError::LockPoisoned
    })?;

    f(db.connection()).map_err(|e| {
        log::error!("Failed to {operation}: {e}");
        e
    })
}

/// Like [`with_connection`], but runs `f` inside a transaction that is only
/// committed when `f` succeeds.
pub fn with_transaction<F, T>(db: &Arc<Mutex<Database>>, operation: &str, f: F) -> Result<T, AppError>
where
    F: FnOnce(&Connection) -> Result<T, AppError>,
{
    with_connection(db, operation, |conn| {
        let tx = conn.unchecked_transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    })
}
