pub mod schema;
pub mod migrations;
pub mod helpers;
pub use helpers::{with_connection, with_transaction};

use crate::error::AppError;
use crate::store::Storage;
use rusqlite::{params, Connection, OptionalExtension, Result};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub struct Database {
    conn: Connection,
}

/// Database handle shared between the engine's components.
pub type SharedDatabase = Arc<Mutex<Database>>;

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_shared(self) -> SharedDatabase {
        Arc::new(Mutex::new(self))
    }
}

impl Storage for SharedDatabase {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        with_connection(self, "read storage key", |conn| {
            Ok(conn
                .query_row("SELECT value FROM kv_store WHERE key = ?1", params![key], |row| row.get(0))
                .optional()?)
        })
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), AppError> {
        with_transaction(self, "write storage keys", |conn| {
            let mut stmt = conn.prepare("INSERT OR REPLACE INTO kv_store (key, value) VALUES (?1, ?2)")?;
            for (key, value) in entries {
                stmt.execute(params![key, value])?;
            }
            Ok(())
        })
    }

    fn remove(&self, keys: &[&str]) -> Result<(), AppError> {
        with_transaction(self, "remove storage keys", |conn| {
            let mut stmt = conn.prepare("DELETE FROM kv_store WHERE key = ?1")?;
            for key in keys {
                stmt.execute(params![key])?;
            }
            Ok(())
        })
    }
}
