//! Causal hyperedges: relation rows plus `causal_sources` / `causal_targets`
//! join tables.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection};

use mneme_core::codec;
use mneme_core::constants::MAX_SQL_IN_CHUNK;
use mneme_core::errors::MnemeResult;
use mneme_core::memory::MetadataValue;
use mneme_core::models::{CausalRelation, CausalRelationType, Direction};
use mneme_core::time::{from_millis, to_millis};

use super::{placeholders, with_tx, write_err};
use crate::to_storage_err;

struct RelationRow {
    id: String,
    relation_type: String,
    strength: f64,
    metadata: Option<String>,
    created_at: i64,
    ttl_ms: Option<i64>,
    expires_at: Option<i64>,
}

/// Insert the relation row and both join-row sets in one transaction.
pub fn insert_relation(conn: &Connection, relation: &CausalRelation) -> MnemeResult<()> {
    with_tx(conn, "insert_relation", |conn| {
        let metadata = relation.metadata.as_ref().map(codec::encode).transpose()?;
        conn.execute(
            "INSERT INTO causal_relations (id, relation_type, strength, metadata, created_at, ttl_ms, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                relation.id,
                relation.relation_type.as_str(),
                relation.strength,
                metadata,
                to_millis(&relation.created_at),
                relation.ttl_ms,
                relation.expires_at.as_ref().map(to_millis),
            ],
        )
        .map_err(write_err)?;

        let mut sources = conn
            .prepare_cached("INSERT INTO causal_sources (relation_id, entry_id) VALUES (?1, ?2)")
            .map_err(|e| to_storage_err(e.to_string()))?;
        for id in &relation.source_ids {
            sources.execute(params![relation.id, id]).map_err(write_err)?;
        }
        let mut targets = conn
            .prepare_cached("INSERT INTO causal_targets (relation_id, entry_id) VALUES (?1, ?2)")
            .map_err(|e| to_storage_err(e.to_string()))?;
        for id in &relation.target_ids {
            targets.execute(params![relation.id, id]).map_err(write_err)?;
        }
        Ok(())
    })
}

pub fn get_relation(conn: &Connection, id: &str) -> MnemeResult<Option<CausalRelation>> {
    Ok(load_relations(conn, &[id.to_string()])?.into_iter().next())
}

/// Relations for `ids` in input order, with endpoint sets prefetched.
pub fn load_relations(conn: &Connection, ids: &[String]) -> MnemeResult<Vec<CausalRelation>> {
    let mut seen = HashSet::with_capacity(ids.len());
    let unique: Vec<&String> = ids.iter().filter(|id| seen.insert(id.as_str())).collect();

    let mut rows: HashMap<String, RelationRow> = HashMap::with_capacity(unique.len());
    let mut sources: HashMap<String, BTreeSet<String>> = HashMap::new();
    let mut targets: HashMap<String, BTreeSet<String>> = HashMap::new();

    for chunk in unique.chunks(MAX_SQL_IN_CHUNK) {
        let marks = placeholders(chunk.len());
        let sql = format!(
            "SELECT id, relation_type, strength, metadata, created_at, ttl_ms, expires_at
             FROM causal_relations WHERE id IN ({marks})"
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| to_storage_err(e.to_string()))?;
        let fetched = stmt
            .query_map(params_from_iter(chunk.iter()), |row| {
                Ok(RelationRow {
                    id: row.get(0)?,
                    relation_type: row.get(1)?,
                    strength: row.get(2)?,
                    metadata: row.get(3)?,
                    created_at: row.get(4)?,
                    ttl_ms: row.get(5)?,
                    expires_at: row.get(6)?,
                })
            })
            .map_err(|e| to_storage_err(e.to_string()))?;
        for row in fetched {
            let row = row.map_err(|e| to_storage_err(e.to_string()))?;
            rows.insert(row.id.clone(), row);
        }

        load_endpoints(conn, "causal_sources", chunk, &marks, &mut sources)?;
        load_endpoints(conn, "causal_targets", chunk, &marks, &mut targets)?;
    }

    unique
        .iter()
        .filter_map(|id| rows.remove(*id))
        .map(|row| -> MnemeResult<CausalRelation> {
            let relation_type: CausalRelationType = row.relation_type.parse()?;
            let metadata: Option<BTreeMap<String, MetadataValue>> =
                row.metadata.as_deref().map(codec::decode).transpose()?;
            Ok(CausalRelation {
                source_ids: sources.remove(&row.id).unwrap_or_default(),
                target_ids: targets.remove(&row.id).unwrap_or_default(),
                id: row.id,
                relation_type,
                strength: row.strength,
                metadata,
                created_at: from_millis(row.created_at),
                ttl_ms: row.ttl_ms,
                expires_at: row.expires_at.map(from_millis),
            })
        })
        .collect()
}

fn load_endpoints(
    conn: &Connection,
    table: &str,
    chunk: &[&String],
    marks: &str,
    into: &mut HashMap<String, BTreeSet<String>>,
) -> MnemeResult<()> {
    let sql = format!("SELECT relation_id, entry_id FROM {table} WHERE relation_id IN ({marks})");
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params_from_iter(chunk.iter()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;
    for row in rows {
        let (relation_id, entry_id) = row.map_err(|e| to_storage_err(e.to_string()))?;
        into.entry(relation_id).or_default().insert(entry_id);
    }
    Ok(())
}

/// Relations where `entry_id` is a source, a target, or either. The id set is
/// deduplicated in SQL so a self-loop appears once.
pub fn get_relations_for_entry(
    conn: &Connection,
    entry_id: &str,
    direction: Direction,
) -> MnemeResult<Vec<CausalRelation>> {
    let sql = match direction {
        Direction::Forward => "SELECT relation_id FROM causal_sources WHERE entry_id = ?1",
        Direction::Backward => "SELECT relation_id FROM causal_targets WHERE entry_id = ?1",
        Direction::Both => {
            "SELECT relation_id FROM causal_sources WHERE entry_id = ?1
             UNION
             SELECT relation_id FROM causal_targets WHERE entry_id = ?1"
        }
    };
    let ids = select_ids(conn, sql, params![entry_id])?;
    let mut relations = load_relations(conn, &ids)?;
    relations.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(relations)
}

/// Deletes the relation; join rows cascade.
pub fn delete_relation(conn: &Connection, id: &str) -> MnemeResult<bool> {
    let changed = conn
        .execute("DELETE FROM causal_relations WHERE id = ?1", params![id])
        .map_err(write_err)?;
    Ok(changed > 0)
}

pub fn count_expired(conn: &Connection, now: DateTime<Utc>) -> MnemeResult<usize> {
    let n: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM causal_relations
             WHERE expires_at IS NOT NULL AND expires_at <= ?1",
            params![to_millis(&now)],
            |row| row.get(0),
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(n as usize)
}

pub fn get_expired(conn: &Connection, now: DateTime<Utc>) -> MnemeResult<Vec<CausalRelation>> {
    let ids = expired_ids(conn, now)?;
    load_relations(conn, &ids)
}

/// Delete every expired relation together with its join rows.
pub fn delete_expired(conn: &Connection, now: DateTime<Utc>) -> MnemeResult<Vec<String>> {
    with_tx(conn, "delete_expired", |conn| {
        let ids = expired_ids(conn, now)?;
        for chunk in ids.chunks(MAX_SQL_IN_CHUNK) {
            let sql = format!(
                "DELETE FROM causal_relations WHERE id IN ({})",
                placeholders(chunk.len())
            );
            conn.execute(&sql, params_from_iter(chunk.iter()))
                .map_err(write_err)?;
        }
        Ok(ids)
    })
}

fn expired_ids(conn: &Connection, now: DateTime<Utc>) -> MnemeResult<Vec<String>> {
    select_ids(
        conn,
        "SELECT id FROM causal_relations
         WHERE expires_at IS NOT NULL AND expires_at <= ?1
         ORDER BY expires_at, id",
        params![to_millis(&now)],
    )
}

pub fn relation_count(conn: &Connection) -> MnemeResult<usize> {
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM causal_relations", [], |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(n as usize)
}

/// Ids of relations that reference any of `entry_ids` on either side.
pub(crate) fn relation_ids_touching(conn: &Connection, entry_ids: &[String]) -> MnemeResult<Vec<String>> {
    let mut ids = BTreeSet::new();
    for chunk in entry_ids.chunks(MAX_SQL_IN_CHUNK) {
        let marks = placeholders(chunk.len());
        let sql = format!(
            "SELECT relation_id FROM causal_sources WHERE entry_id IN ({marks})
             UNION
             SELECT relation_id FROM causal_targets WHERE entry_id IN ({marks})"
        );
        let binds = chunk.iter().chain(chunk.iter());
        ids.extend(select_ids(conn, &sql, params_from_iter(binds))?);
    }
    Ok(ids.into_iter().collect())
}

/// Among `candidates`, delete relations left with no sources or no targets.
pub(crate) fn delete_orphaned(conn: &Connection, candidates: &[String]) -> MnemeResult<usize> {
    let mut removed = 0;
    for chunk in candidates.chunks(MAX_SQL_IN_CHUNK) {
        let sql = format!(
            "DELETE FROM causal_relations
             WHERE id IN ({})
               AND (NOT EXISTS (SELECT 1 FROM causal_sources s WHERE s.relation_id = causal_relations.id)
                 OR NOT EXISTS (SELECT 1 FROM causal_targets t WHERE t.relation_id = causal_relations.id))",
            placeholders(chunk.len())
        );
        removed += conn
            .execute(&sql, params_from_iter(chunk.iter()))
            .map_err(write_err)?;
    }
    Ok(removed)
}

fn select_ids<P: rusqlite::Params>(conn: &Connection, sql: &str, binds: P) -> MnemeResult<Vec<String>> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let ids = stmt
        .query_map(binds, |row| row.get::<_, String>(0))
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(ids)
}
