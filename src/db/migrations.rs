use super::schema::SCHEMA;
use rusqlite::{Connection, Result};

/// Create the schema. Safe to run on every start.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
