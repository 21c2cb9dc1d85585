//! v001: memory_entries, memory_tags, provenance, provenance_links, system_metadata.

use rusqlite::Connection;

use mneme_core::errors::MnemeResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> MnemeResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS memory_entries (
            id            TEXT PRIMARY KEY,
            content       TEXT NOT NULL,
            source        TEXT NOT NULL DEFAULT 'agent',
            importance    REAL NOT NULL DEFAULT 0.5,
            session_id    TEXT,
            agent_id      TEXT,
            context       TEXT,
            content_hash  TEXT NOT NULL,
            created_at    INTEGER NOT NULL,
            updated_at    INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_entries_created ON memory_entries(created_at);
        CREATE INDEX IF NOT EXISTS idx_entries_session ON memory_entries(session_id);
        CREATE INDEX IF NOT EXISTS idx_entries_hash ON memory_entries(content_hash);

        CREATE TABLE IF NOT EXISTS memory_tags (
            entry_id  TEXT NOT NULL REFERENCES memory_entries(id) ON DELETE CASCADE,
            tag       TEXT NOT NULL,
            PRIMARY KEY (entry_id, tag)
        );

        CREATE INDEX IF NOT EXISTS idx_tags_tag ON memory_tags(tag);

        CREATE TABLE IF NOT EXISTS provenance (
            entry_id       TEXT PRIMARY KEY REFERENCES memory_entries(id) ON DELETE CASCADE,
            lineage_depth  INTEGER NOT NULL DEFAULT 0,
            confidence     REAL NOT NULL DEFAULT 1.0,
            relevance      REAL NOT NULL DEFAULT 1.0,
            l_score        REAL
        );

        -- No foreign key on parent_id: links outlive deleted parents.
        CREATE TABLE IF NOT EXISTS provenance_links (
            child_id   TEXT NOT NULL REFERENCES memory_entries(id) ON DELETE CASCADE,
            parent_id  TEXT NOT NULL,
            PRIMARY KEY (child_id, parent_id)
        );

        CREATE INDEX IF NOT EXISTS idx_links_parent ON provenance_links(parent_id);

        CREATE TABLE IF NOT EXISTS system_metadata (
            key         TEXT PRIMARY KEY,
            value       TEXT NOT NULL,
            updated_at  INTEGER NOT NULL
        );
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
