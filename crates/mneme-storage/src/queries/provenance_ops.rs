//! Provenance rows, parent links, and the recursive lineage walk.

use std::collections::HashMap;

use rusqlite::{params, params_from_iter, Connection};

use mneme_core::constants::{MAX_LINEAGE_DEPTH, MAX_SQL_IN_CHUNK};
use mneme_core::errors::MnemeResult;
use mneme_core::memory::ProvenanceInfo;
use mneme_core::models::LineageLink;

use super::{placeholders, write_err};
use crate::to_storage_err;

pub fn insert_provenance(conn: &Connection, entry_id: &str, info: &ProvenanceInfo) -> MnemeResult<()> {
    conn.execute(
        "INSERT INTO provenance (entry_id, lineage_depth, confidence, relevance, l_score)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            entry_id,
            info.lineage_depth,
            info.confidence,
            info.relevance,
            info.l_score
        ],
    )
    .map_err(write_err)?;

    let mut stmt = conn
        .prepare_cached(
            "INSERT OR IGNORE INTO provenance_links (child_id, parent_id) VALUES (?1, ?2)",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    for parent in &info.parent_ids {
        stmt.execute(params![entry_id, parent]).map_err(write_err)?;
    }
    Ok(())
}

pub fn get_provenance(conn: &Connection, id: &str) -> MnemeResult<Option<ProvenanceInfo>> {
    Ok(load_provenance_map(conn, &[id.to_string()])?.remove(id))
}

/// Provenance for every id that has a row, with parent sets prefetched.
pub fn load_provenance_map(
    conn: &Connection,
    ids: &[String],
) -> MnemeResult<HashMap<String, ProvenanceInfo>> {
    let mut map: HashMap<String, ProvenanceInfo> = HashMap::with_capacity(ids.len());
    for chunk in ids.chunks(MAX_SQL_IN_CHUNK) {
        let marks = placeholders(chunk.len());

        let sql = format!(
            "SELECT entry_id, lineage_depth, confidence, relevance, l_score
             FROM provenance WHERE entry_id IN ({marks})"
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| to_storage_err(e.to_string()))?;
        let rows = stmt
            .query_map(params_from_iter(chunk.iter()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    ProvenanceInfo {
                        parent_ids: Default::default(),
                        lineage_depth: row.get(1)?,
                        confidence: row.get(2)?,
                        relevance: row.get(3)?,
                        l_score: row.get(4)?,
                    },
                ))
            })
            .map_err(|e| to_storage_err(e.to_string()))?;
        for row in rows {
            let (id, info) = row.map_err(|e| to_storage_err(e.to_string()))?;
            map.insert(id, info);
        }

        let sql = format!(
            "SELECT child_id, parent_id FROM provenance_links WHERE child_id IN ({marks})"
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| to_storage_err(e.to_string()))?;
        let links = stmt
            .query_map(params_from_iter(chunk.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e| to_storage_err(e.to_string()))?;
        for link in links {
            let (child, parent) = link.map_err(|e| to_storage_err(e.to_string()))?;
            if let Some(info) = map.get_mut(&child) {
                info.parent_ids.insert(parent);
            }
        }
    }
    Ok(map)
}

/// Cache an L-Score. Returns false when the entry has no provenance row.
pub fn update_l_score(conn: &Connection, id: &str, l_score: f64) -> MnemeResult<bool> {
    let changed = conn
        .execute(
            "UPDATE provenance SET l_score = ?2 WHERE entry_id = ?1",
            params![id, l_score],
        )
        .map_err(write_err)?;
    Ok(changed > 0)
}

/// Every child→parent link reachable from `root_id` within `max_depth` hops,
/// each reported at its shallowest depth. Cycles terminate at the depth bound.
pub fn lineage_links(conn: &Connection, root_id: &str, max_depth: u32) -> MnemeResult<Vec<LineageLink>> {
    let depth = max_depth.min(MAX_LINEAGE_DEPTH);
    if depth == 0 {
        return Ok(Vec::new());
    }
    let mut stmt = conn
        .prepare_cached(
            "WITH RECURSIVE lineage(child_id, parent_id, depth) AS (
                SELECT child_id, parent_id, 1 FROM provenance_links WHERE child_id = ?1
                UNION
                SELECT pl.child_id, pl.parent_id, l.depth + 1
                FROM provenance_links pl
                JOIN lineage l ON pl.child_id = l.parent_id
                WHERE l.depth < ?2
             )
             SELECT child_id, parent_id, MIN(depth) AS depth
             FROM lineage
             GROUP BY child_id, parent_id
             ORDER BY depth, child_id, parent_id",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let links = stmt
        .query_map(params![root_id, depth], |row| {
            Ok(LineageLink {
                child_id: row.get(0)?,
                parent_id: row.get(1)?,
                depth: row.get(2)?,
            })
        })
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(links)
}
