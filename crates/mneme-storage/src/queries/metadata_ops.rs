//! system_metadata key/value store.

use rusqlite::{params, Connection, OptionalExtension};

use mneme_core::errors::MnemeResult;
use mneme_core::time::{now, to_millis};

use super::write_err;
use crate::to_storage_err;

pub fn get(conn: &Connection, key: &str) -> MnemeResult<Option<String>> {
    conn.query_row(
        "SELECT value FROM system_metadata WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| to_storage_err(e.to_string()))
}

pub fn set(conn: &Connection, key: &str, value: &str) -> MnemeResult<()> {
    conn.execute(
        "INSERT INTO system_metadata (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, to_millis(&now())],
    )
    .map_err(write_err)?;
    Ok(())
}
