//! v005: memrl_queries, feedback_ratings, feedback_disagreements.

use rusqlite::Connection;

use mneme_core::errors::MnemeResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> MnemeResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS memrl_queries (
            id            TEXT PRIMARY KEY,
            query_text    TEXT NOT NULL,
            candidates    TEXT NOT NULL,
            delta         REAL NOT NULL,
            lambda        REAL NOT NULL,
            has_feedback  INTEGER NOT NULL DEFAULT 0,
            created_at    INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_memrl_feedback ON memrl_queries(has_feedback);

        CREATE TABLE IF NOT EXISTS feedback_ratings (
            query_id    TEXT NOT NULL REFERENCES memrl_queries(id) ON DELETE CASCADE,
            is_auto     INTEGER NOT NULL,
            score       INTEGER NOT NULL CHECK (score BETWEEN 1 AND 10),
            created_at  INTEGER NOT NULL,
            PRIMARY KEY (query_id, is_auto)
        );

        -- Append-only audit trail; survives query deletion.
        CREATE TABLE IF NOT EXISTS feedback_disagreements (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            query_id     TEXT NOT NULL,
            auto_score   INTEGER NOT NULL,
            human_score  INTEGER NOT NULL,
            context      TEXT,
            created_at   INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_disagreements_query ON feedback_disagreements(query_id);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
