//! Memory entry CRUD. Reads fetch entry rows first, then prefetch tags and
//! provenance for the whole id set into maps before stitching.

use std::collections::{BTreeSet, HashMap, HashSet};

use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use mneme_core::codec;
use mneme_core::constants::{MAX_SQL_IN_CHUNK, Q_VALUE_INITIAL};
use mneme_core::errors::{MnemeError, MnemeResult};
use mneme_core::memory::{ContextPayload, MemoryEntry, MemoryMetadata, MemorySource};
use mneme_core::models::DeletionReport;
use mneme_core::time::{from_millis, to_millis};

use super::{causal_ops, placeholders, provenance_ops, with_tx, write_err};
use crate::to_storage_err;

const ENTRY_COLUMNS: &str = "id, content, source, importance, session_id, agent_id, context, \
                             content_hash, created_at, updated_at";

struct EntryRow {
    id: String,
    content: String,
    source: String,
    importance: f64,
    session_id: Option<String>,
    agent_id: Option<String>,
    context: Option<String>,
    content_hash: String,
    created_at: i64,
    updated_at: i64,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<EntryRow> {
    Ok(EntryRow {
        id: row.get(0)?,
        content: row.get(1)?,
        source: row.get(2)?,
        importance: row.get(3)?,
        session_id: row.get(4)?,
        agent_id: row.get(5)?,
        context: row.get(6)?,
        content_hash: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

/// Insert an entry with its tags, provenance, and parent links atomically.
/// The entry starts with the initial Q-value.
pub fn insert_entry(conn: &Connection, entry: &MemoryEntry) -> MnemeResult<()> {
    with_tx(conn, "insert_entry", |conn| {
        let context = entry
            .metadata
            .context
            .as_ref()
            .map(codec::encode)
            .transpose()?;
        conn.execute(
            "INSERT INTO memory_entries (
                id, content, source, importance, session_id, agent_id, context,
                content_hash, created_at, updated_at, q_value
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                entry.id,
                entry.content,
                entry.metadata.source.as_str(),
                entry.metadata.importance,
                entry.metadata.session_id,
                entry.metadata.agent_id,
                context,
                entry.content_hash,
                to_millis(&entry.created_at),
                to_millis(&entry.updated_at),
                Q_VALUE_INITIAL,
            ],
        )
        .map_err(write_err)?;

        let mut stmt = conn
            .prepare_cached("INSERT OR IGNORE INTO memory_tags (entry_id, tag) VALUES (?1, ?2)")
            .map_err(|e| to_storage_err(e.to_string()))?;
        for tag in &entry.metadata.tags {
            stmt.execute(params![entry.id, tag]).map_err(write_err)?;
        }

        provenance_ops::insert_provenance(conn, &entry.id, &entry.provenance)
    })
}

pub fn get_entry(conn: &Connection, id: &str) -> MnemeResult<Option<MemoryEntry>> {
    Ok(get_batch_entries(conn, &[id.to_string()])?.into_iter().next())
}

/// Entries for `ids` in first-seen input order. Unknown ids are omitted and
/// duplicates collapse to one result.
pub fn get_batch_entries(conn: &Connection, ids: &[String]) -> MnemeResult<Vec<MemoryEntry>> {
    let mut seen = HashSet::with_capacity(ids.len());
    let unique: Vec<&String> = ids.iter().filter(|id| seen.insert(id.as_str())).collect();

    let mut rows: HashMap<String, EntryRow> = HashMap::with_capacity(unique.len());
    for chunk in unique.chunks(MAX_SQL_IN_CHUNK) {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM memory_entries WHERE id IN ({})",
            placeholders(chunk.len())
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| to_storage_err(e.to_string()))?;
        let fetched = stmt
            .query_map(params_from_iter(chunk.iter()), read_row)
            .map_err(|e| to_storage_err(e.to_string()))?;
        for row in fetched {
            let row = row.map_err(|e| to_storage_err(e.to_string()))?;
            rows.insert(row.id.clone(), row);
        }
    }

    let ordered: Vec<EntryRow> = unique.iter().filter_map(|id| rows.remove(*id)).collect();
    hydrate(conn, ordered)
}

/// All entries, oldest first.
pub fn get_all_entries(conn: &Connection) -> MnemeResult<Vec<MemoryEntry>> {
    let rows = select_rows(
        conn,
        &format!("SELECT {ENTRY_COLUMNS} FROM memory_entries ORDER BY created_at, id"),
        [],
    )?;
    hydrate(conn, rows)
}

/// Newest entries first.
pub fn recent_entries(conn: &Connection, limit: usize) -> MnemeResult<Vec<MemoryEntry>> {
    let rows = select_rows(
        conn,
        &format!(
            "SELECT {ENTRY_COLUMNS} FROM memory_entries
             ORDER BY created_at DESC, rowid DESC LIMIT ?1"
        ),
        params![limit as i64],
    )?;
    hydrate(conn, rows)
}

/// Newest session-context entries first. Matches both the enveloped and the
/// bare JSON form of the context column.
pub fn recent_session_entries(conn: &Connection, limit: usize) -> MnemeResult<Vec<MemoryEntry>> {
    let rows = select_rows(
        conn,
        &format!(
            "SELECT {ENTRY_COLUMNS} FROM memory_entries
             WHERE context IS NOT NULL
               AND CASE WHEN json_valid(context)
                        THEN COALESCE(json_extract(context, '$.data.kind'),
                                      json_extract(context, '$.kind'))
                   END = 'session'
             ORDER BY created_at DESC, rowid DESC LIMIT ?1"
        ),
        params![limit as i64],
    )?;
    hydrate(conn, rows)
}

/// Entries carrying any (or, with `match_all`, every) tag in `tags`,
/// oldest first. An empty tag list matches nothing.
pub fn query_by_tags(
    conn: &Connection,
    tags: &[String],
    match_all: bool,
) -> MnemeResult<Vec<MemoryEntry>> {
    let wanted: Vec<&String> = tags.iter().collect::<BTreeSet<_>>().into_iter().collect();
    if wanted.is_empty() {
        return Ok(Vec::new());
    }
    if wanted.len() > MAX_SQL_IN_CHUNK {
        return Err(MnemeError::ValidationError(format!(
            "at most {MAX_SQL_IN_CHUNK} tags per query"
        )));
    }
    let needed = if match_all { wanted.len() } else { 1 };
    let sql = format!(
        "SELECT t.entry_id FROM memory_tags t
         JOIN memory_entries e ON e.id = t.entry_id
         WHERE t.tag IN ({})
         GROUP BY t.entry_id
         HAVING COUNT(DISTINCT t.tag) >= {needed}
         ORDER BY MIN(e.created_at), t.entry_id",
        placeholders(wanted.len())
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let ids = stmt
        .query_map(params_from_iter(wanted.iter()), |row| row.get::<_, String>(0))
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;
    get_batch_entries(conn, &ids)
}

pub fn entry_exists(conn: &Connection, id: &str) -> MnemeResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM memory_entries WHERE id = ?1",
            params![id],
            |_| Ok(()),
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(found.is_some())
}

pub fn count_entries(conn: &Connection) -> MnemeResult<usize> {
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM memory_entries", [], |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(n as usize)
}

pub fn delete_entry(conn: &Connection, id: &str) -> MnemeResult<DeletionReport> {
    with_tx(conn, "delete_entry", |conn| {
        delete_entries_inner(conn, &[id.to_string()])
    })
}

/// Delete every entry that carries none of `keep_tags`. With no tags to keep,
/// everything goes.
pub fn delete_except_tags(conn: &Connection, keep_tags: &[String]) -> MnemeResult<DeletionReport> {
    with_tx(conn, "delete_except_tags", |conn| {
        let keep: Vec<&String> = keep_tags.iter().collect::<BTreeSet<_>>().into_iter().collect();
        let mut kept: HashSet<String> = HashSet::new();
        for chunk in keep.chunks(MAX_SQL_IN_CHUNK) {
            let sql = format!(
                "SELECT DISTINCT entry_id FROM memory_tags WHERE tag IN ({})",
                placeholders(chunk.len())
            );
            kept.extend(select_ids(conn, &sql, chunk.to_vec())?);
        }
        let ids: Vec<String> = select_ids(
            conn,
            "SELECT id FROM memory_entries ORDER BY created_at, id",
            Vec::<&String>::new(),
        )?
        .into_iter()
        .filter(|id| !kept.contains(id))
        .collect();
        delete_entries_inner(conn, &ids)
    })
}

/// Delete entries (children cascade through foreign keys) and then any
/// relation left with an empty source or target set.
fn delete_entries_inner(conn: &Connection, ids: &[String]) -> MnemeResult<DeletionReport> {
    let mut report = DeletionReport::default();
    for chunk in ids.chunks(MAX_SQL_IN_CHUNK) {
        let sql = format!(
            "SELECT e.id, v.label FROM memory_entries e
             LEFT JOIN vector_mappings v ON v.entry_id = e.id
             WHERE e.id IN ({})",
            placeholders(chunk.len())
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| to_storage_err(e.to_string()))?;
        let rows = stmt
            .query_map(params_from_iter(chunk.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<i64>>(1)?))
            })
            .map_err(|e| to_storage_err(e.to_string()))?;
        for row in rows {
            let (id, label) = row.map_err(|e| to_storage_err(e.to_string()))?;
            report.entry_ids.push(id);
            if let Some(label) = label {
                report.labels.push(label as u64);
            }
        }
    }
    if report.entry_ids.is_empty() {
        return Ok(report);
    }

    let touched = causal_ops::relation_ids_touching(conn, &report.entry_ids)?;
    for chunk in report.entry_ids.chunks(MAX_SQL_IN_CHUNK) {
        let sql = format!(
            "DELETE FROM memory_entries WHERE id IN ({})",
            placeholders(chunk.len())
        );
        conn.execute(&sql, params_from_iter(chunk.iter()))
            .map_err(write_err)?;
    }
    report.orphaned_relations = causal_ops::delete_orphaned(conn, &touched)?;

    tracing::debug!(
        deleted = report.entry_ids.len(),
        orphaned_relations = report.orphaned_relations,
        "deleted entries"
    );
    Ok(report)
}

fn select_rows<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> MnemeResult<Vec<EntryRow>> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params, read_row)
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(rows)
}

fn select_ids(conn: &Connection, sql: &str, binds: Vec<&String>) -> MnemeResult<Vec<String>> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let ids = stmt
        .query_map(params_from_iter(binds), |row| row.get::<_, String>(0))
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(ids)
}

/// Stitch rows with prefetched tags and provenance, preserving row order.
fn hydrate(conn: &Connection, rows: Vec<EntryRow>) -> MnemeResult<Vec<MemoryEntry>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let mut tags = load_tags(conn, &ids)?;
    let mut provenance = provenance_ops::load_provenance_map(conn, &ids)?;

    rows.into_iter()
        .map(|row| -> MnemeResult<MemoryEntry> {
            let source: MemorySource = row.source.parse()?;
            let context: Option<ContextPayload> =
                row.context.as_deref().map(codec::decode).transpose()?;
            Ok(MemoryEntry {
                metadata: MemoryMetadata {
                    source,
                    tags: tags.remove(&row.id).unwrap_or_default(),
                    importance: row.importance,
                    session_id: row.session_id,
                    agent_id: row.agent_id,
                    context,
                },
                provenance: provenance.remove(&row.id).unwrap_or_default(),
                id: row.id,
                content: row.content,
                content_hash: row.content_hash,
                created_at: from_millis(row.created_at),
                updated_at: from_millis(row.updated_at),
            })
        })
        .collect()
}

fn load_tags(conn: &Connection, ids: &[String]) -> MnemeResult<HashMap<String, BTreeSet<String>>> {
    let mut map: HashMap<String, BTreeSet<String>> = HashMap::with_capacity(ids.len());
    for chunk in ids.chunks(MAX_SQL_IN_CHUNK) {
        let sql = format!(
            "SELECT entry_id, tag FROM memory_tags WHERE entry_id IN ({})",
            placeholders(chunk.len())
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| to_storage_err(e.to_string()))?;
        let rows = stmt
            .query_map(params_from_iter(chunk.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e| to_storage_err(e.to_string()))?;
        for row in rows {
            let (entry_id, tag) = row.map_err(|e| to_storage_err(e.to_string()))?;
            map.entry(entry_id).or_default().insert(tag);
        }
    }
    Ok(map)
}
