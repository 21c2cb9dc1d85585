//! Entry ↔ label mappings, access counters, and compression tiers.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use mneme_core::config::TieringConfig;
use mneme_core::constants::MAX_SQL_IN_CHUNK;
use mneme_core::errors::MnemeResult;
use mneme_core::models::{CompressionTier, TierCounts, VectorMapping};
use mneme_core::time::{from_millis, to_millis};

use super::{is_constraint_violation, placeholders, with_tx, write_err};
use crate::to_storage_err;

const MAPPING_COLUMNS: &str = "entry_id, label, access_count, last_accessed_at, compression_tier";

fn read_mapping(row: &Row<'_>) -> rusqlite::Result<(VectorMapping, String)> {
    Ok((
        VectorMapping {
            entry_id: row.get(0)?,
            label: row.get::<_, i64>(1)? as u64,
            access_count: row.get::<_, i64>(2)? as u64,
            last_accessed_at: row.get::<_, Option<i64>>(3)?.map(from_millis),
            compression_tier: CompressionTier::Hot,
        },
        row.get(4)?,
    ))
}

fn with_tier((mut mapping, tier): (VectorMapping, String)) -> MnemeResult<VectorMapping> {
    mapping.compression_tier = tier.parse()?;
    Ok(mapping)
}

pub fn get_mapping(conn: &Connection, entry_id: &str) -> MnemeResult<Option<VectorMapping>> {
    conn.query_row(
        &format!("SELECT {MAPPING_COLUMNS} FROM vector_mappings WHERE entry_id = ?1"),
        params![entry_id],
        read_mapping,
    )
    .optional()
    .map_err(|e| to_storage_err(e.to_string()))?
    .map(with_tier)
    .transpose()
}

pub fn all_mappings(conn: &Connection) -> MnemeResult<Vec<VectorMapping>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {MAPPING_COLUMNS} FROM vector_mappings ORDER BY label"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], read_mapping)
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.into_iter().map(with_tier).collect()
}

/// Highest label in use, if any.
pub fn max_label(conn: &Connection) -> MnemeResult<Option<u64>> {
    let max: Option<i64> = conn
        .query_row("SELECT MAX(label) FROM vector_mappings", [], |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(max.map(|l| l as u64))
}

/// Insert a mapping under `label`. Returns `Ok(false)` on a uniqueness
/// collision so the caller can resync and retry.
pub fn try_insert_mapping(
    conn: &Connection,
    entry_id: &str,
    label: u64,
    now: DateTime<Utc>,
) -> MnemeResult<bool> {
    match conn.execute(
        "INSERT INTO vector_mappings (entry_id, label, created_at) VALUES (?1, ?2, ?3)",
        params![entry_id, label as i64, to_millis(&now)],
    ) {
        Ok(_) => Ok(true),
        Err(e) if is_constraint_violation(&e) => Ok(false),
        Err(e) => Err(write_err(e)),
    }
}

/// Insert a mapping whose label is computed by the statement itself from the
/// current maximum. Used once optimistic retries are exhausted.
pub fn insert_mapping_rescan(
    conn: &Connection,
    entry_id: &str,
    now: DateTime<Utc>,
) -> MnemeResult<u64> {
    conn.execute(
        "INSERT INTO vector_mappings (entry_id, label, created_at)
         VALUES (?1, (SELECT COALESCE(MAX(label), -1) + 1 FROM vector_mappings), ?2)",
        params![entry_id, to_millis(&now)],
    )
    .map_err(write_err)?;
    let label: i64 = conn
        .query_row(
            "SELECT label FROM vector_mappings WHERE entry_id = ?1",
            params![entry_id],
            |row| row.get(0),
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(label as u64)
}

pub fn entry_ids_for_labels(conn: &Connection, labels: &[u64]) -> MnemeResult<HashMap<u64, String>> {
    let mut map = HashMap::with_capacity(labels.len());
    let labels: Vec<i64> = labels.iter().map(|l| *l as i64).collect();
    for chunk in labels.chunks(MAX_SQL_IN_CHUNK) {
        let sql = format!(
            "SELECT label, entry_id FROM vector_mappings WHERE label IN ({})",
            placeholders(chunk.len())
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| to_storage_err(e.to_string()))?;
        let rows = stmt
            .query_map(params_from_iter(chunk.iter()), |row| {
                Ok((row.get::<_, i64>(0)? as u64, row.get::<_, String>(1)?))
            })
            .map_err(|e| to_storage_err(e.to_string()))?;
        for row in rows {
            let (label, entry_id) = row.map_err(|e| to_storage_err(e.to_string()))?;
            map.insert(label, entry_id);
        }
    }
    Ok(map)
}

/// Increment access counters for `entry_ids` in one transaction.
pub fn record_access(conn: &Connection, entry_ids: &[String], at: DateTime<Utc>) -> MnemeResult<usize> {
    if entry_ids.is_empty() {
        return Ok(0);
    }
    with_tx(conn, "record_access", |conn| {
        let mut stmt = conn
            .prepare_cached(
                "UPDATE vector_mappings
                 SET access_count = access_count + 1, last_accessed_at = ?2
                 WHERE entry_id = ?1",
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
        let mut touched = 0;
        for id in entry_ids {
            touched += stmt
                .execute(params![id, to_millis(&at)])
                .map_err(write_err)?;
        }
        Ok(touched)
    })
}

/// Tier for a vector: frequently accessed vectors stay hot, the rest age into
/// warm and cold by time since last access (or creation if never accessed).
pub fn classify_tier(
    policy: &TieringConfig,
    access_count: u64,
    last_touch: DateTime<Utc>,
    now: DateTime<Utc>,
) -> CompressionTier {
    if access_count >= policy.hot_min_access {
        return CompressionTier::Hot;
    }
    let idle = now - last_touch;
    if idle >= Duration::days(i64::from(policy.cold_after_days)) {
        CompressionTier::Cold
    } else if idle >= Duration::days(i64::from(policy.warm_after_days)) {
        CompressionTier::Warm
    } else {
        CompressionTier::Hot
    }
}

/// Reclassify every mapping. Returns how many changed tier.
pub fn update_tiers(conn: &Connection, policy: &TieringConfig, now: DateTime<Utc>) -> MnemeResult<usize> {
    with_tx(conn, "update_tiers", |conn| {
        let mut stmt = conn
            .prepare(
                "SELECT entry_id, access_count, COALESCE(last_accessed_at, created_at), compression_tier
                 FROM vector_mappings",
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)? as u64,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(|e| to_storage_err(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| to_storage_err(e.to_string()))?;

        let mut update = conn
            .prepare_cached("UPDATE vector_mappings SET compression_tier = ?2 WHERE entry_id = ?1")
            .map_err(|e| to_storage_err(e.to_string()))?;
        let mut changed = 0;
        for (entry_id, access_count, last_touch, current) in rows {
            let tier = classify_tier(policy, access_count, from_millis(last_touch), now);
            if tier.as_str() != current {
                update
                    .execute(params![entry_id, tier.as_str()])
                    .map_err(write_err)?;
                changed += 1;
            }
        }
        Ok(changed)
    })
}

pub fn tier_counts(conn: &Connection) -> MnemeResult<TierCounts> {
    let mut stmt = conn
        .prepare("SELECT compression_tier, COUNT(*) FROM vector_mappings GROUP BY compression_tier")
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut counts = TierCounts::default();
    for row in rows {
        let (tier, n) = row.map_err(|e| to_storage_err(e.to_string()))?;
        match tier.parse::<CompressionTier>()? {
            CompressionTier::Hot => counts.hot = n as usize,
            CompressionTier::Warm => counts.warm = n as usize,
            CompressionTier::Cold => counts.cold = n as usize,
        }
    }
    Ok(counts)
}
