//! v003: pattern_templates, pattern_stats.

use rusqlite::Connection;

use mneme_core::errors::MnemeResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> MnemeResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS pattern_templates (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL UNIQUE,
            pattern     TEXT NOT NULL,
            slots       TEXT NOT NULL,
            priority    INTEGER NOT NULL DEFAULT 0,
            created_at  INTEGER NOT NULL,
            updated_at  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_templates_priority ON pattern_templates(priority DESC);

        CREATE TABLE IF NOT EXISTS pattern_stats (
            template_id    TEXT PRIMARY KEY REFERENCES pattern_templates(id) ON DELETE CASCADE,
            use_count      INTEGER NOT NULL DEFAULT 0,
            success_count  INTEGER NOT NULL DEFAULT 0,
            last_used_at   INTEGER
        );
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
