//! v006: Q-values on entries and compression tiers on vector mappings.

use rusqlite::Connection;

use mneme_core::errors::MnemeResult;

use super::add_column_if_missing;
use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> MnemeResult<()> {
    add_column_if_missing(conn, "memory_entries", "q_value", "REAL NOT NULL DEFAULT 0.5")?;
    add_column_if_missing(
        conn,
        "vector_mappings",
        "compression_tier",
        "TEXT NOT NULL DEFAULT 'hot'",
    )?;

    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_entries_q_value ON memory_entries(q_value);
        CREATE INDEX IF NOT EXISTS idx_vectors_tier ON vector_mappings(compression_tier);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
