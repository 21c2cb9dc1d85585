//! v002: causal_relations with source/target join tables.

use rusqlite::Connection;

use mneme_core::errors::MnemeResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> MnemeResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS causal_relations (
            id             TEXT PRIMARY KEY,
            relation_type  TEXT NOT NULL,
            strength       REAL NOT NULL,
            metadata       TEXT,
            created_at     INTEGER NOT NULL,
            ttl_ms         INTEGER,
            expires_at     INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_causal_expires
            ON causal_relations(expires_at) WHERE expires_at IS NOT NULL;
        CREATE INDEX IF NOT EXISTS idx_causal_type ON causal_relations(relation_type);

        CREATE TABLE IF NOT EXISTS causal_sources (
            relation_id  TEXT NOT NULL REFERENCES causal_relations(id) ON DELETE CASCADE,
            entry_id     TEXT NOT NULL REFERENCES memory_entries(id) ON DELETE CASCADE,
            PRIMARY KEY (relation_id, entry_id)
        );

        CREATE INDEX IF NOT EXISTS idx_causal_sources_entry ON causal_sources(entry_id);

        CREATE TABLE IF NOT EXISTS causal_targets (
            relation_id  TEXT NOT NULL REFERENCES causal_relations(id) ON DELETE CASCADE,
            entry_id     TEXT NOT NULL REFERENCES memory_entries(id) ON DELETE CASCADE,
            PRIMARY KEY (relation_id, entry_id)
        );

        CREATE INDEX IF NOT EXISTS idx_causal_targets_entry ON causal_targets(entry_id);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
