//! Numbered, forward-only schema migrations.
//!
//! Each migration runs in its own transaction and is recorded in
//! `schema_version`. Schema changes are additive: new tables use
//! `IF NOT EXISTS`, new columns go through [`add_column_if_missing`].

mod v001_core_tables;
mod v002_causal_tables;
mod v003_pattern_tables;
mod v004_vector_tables;
mod v005_memrl_tables;
mod v006_additive_columns;

use rusqlite::{params, Connection};
use tracing::info;

use mneme_core::constants::SCHEMA_VERSION;
use mneme_core::errors::{MnemeResult, StorageError};

use crate::to_storage_err;

type MigrationFn = fn(&Connection) -> MnemeResult<()>;

const MIGRATIONS: [(u32, &str, MigrationFn); SCHEMA_VERSION as usize] = [
    (1, "core_tables", v001_core_tables::migrate),
    (2, "causal_tables", v002_causal_tables::migrate),
    (3, "pattern_tables", v003_pattern_tables::migrate),
    (4, "vector_tables", v004_vector_tables::migrate),
    (5, "memrl_tables", v005_memrl_tables::migrate),
    (6, "additive_columns", v006_additive_columns::migrate),
];

/// Apply every pending migration. Returns the resulting schema version.
pub fn run_migrations(conn: &Connection) -> MnemeResult<u32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version     INTEGER PRIMARY KEY,
            applied_at  INTEGER NOT NULL
        );",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    let current = current_version(conn)?;
    for (version, name, migrate) in MIGRATIONS {
        if version <= current {
            continue;
        }
        apply(conn, version, migrate).map_err(|e| StorageError::MigrationFailed {
            version,
            reason: e.to_string(),
        })?;
        info!(version, name, "applied migration");
    }
    current_version(conn)
}

fn apply(conn: &Connection, version: u32, migrate: MigrationFn) -> MnemeResult<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(e.to_string()))?;
    migrate(&tx)?;
    tx.execute(
        "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
        params![version, mneme_core::time::to_millis(&mneme_core::time::now())],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    tx.commit().map_err(|e| to_storage_err(e.to_string()))
}

/// Highest applied migration, 0 for a fresh database.
pub fn current_version(conn: &Connection) -> MnemeResult<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

/// Add a column unless `PRAGMA table_info` already lists it.
pub(crate) fn add_column_if_missing(
    conn: &Connection,
    table: &str,
    column: &str,
    definition: &str,
) -> MnemeResult<bool> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;

    if columns.iter().any(|c| c == column) {
        return Ok(false);
    }
    conn.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN {column} {definition}"))
        .map_err(|e| to_storage_err(e.to_string()))?;
    tracing::debug!(table, column, "added column");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(run_migrations(&conn).unwrap(), SCHEMA_VERSION);
        assert_eq!(run_migrations(&conn).unwrap(), SCHEMA_VERSION);
        let applied: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(applied, i64::from(SCHEMA_VERSION));
    }

    #[test]
    fn add_column_checks_table_info_first() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY);").unwrap();
        assert!(add_column_if_missing(&conn, "t", "extra", "TEXT").unwrap());
        assert!(!add_column_if_missing(&conn, "t", "extra", "TEXT").unwrap());
    }
}
