//! v004: vector_mappings (entry ↔ ANN label).

use rusqlite::Connection;

use mneme_core::errors::MnemeResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> MnemeResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS vector_mappings (
            entry_id          TEXT PRIMARY KEY REFERENCES memory_entries(id) ON DELETE CASCADE,
            label             INTEGER NOT NULL UNIQUE,
            access_count      INTEGER NOT NULL DEFAULT 0,
            last_accessed_at  INTEGER,
            created_at        INTEGER NOT NULL
        );
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
