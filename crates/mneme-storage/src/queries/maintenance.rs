//! Vacuum and row-count statistics.

use rusqlite::Connection;

use mneme_core::errors::MnemeResult;
use mneme_core::models::StorageStats;

use crate::to_storage_err;

/// Rebuild the database file, reclaiming free pages.
pub fn full_vacuum(conn: &Connection) -> MnemeResult<()> {
    conn.execute_batch("VACUUM;")
        .map_err(|e| to_storage_err(format!("vacuum: {e}")))
}

pub fn stats(conn: &Connection) -> MnemeResult<StorageStats> {
    let count = |table: &str| -> MnemeResult<usize> {
        let n: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .map_err(|e| to_storage_err(e.to_string()))?;
        Ok(n as usize)
    };
    Ok(StorageStats {
        entries: count("memory_entries")?,
        tags: count("memory_tags")?,
        provenance_links: count("provenance_links")?,
        relations: count("causal_relations")?,
        templates: count("pattern_templates")?,
        vector_mappings: count("vector_mappings")?,
        memrl_queries: count("memrl_queries")?,
        disagreements: count("feedback_disagreements")?,
    })
}
