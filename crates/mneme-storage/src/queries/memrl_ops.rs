//! MemRL persistence: per-entry Q-values, ranking snapshots, feedback.

use std::collections::HashMap;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use mneme_core::codec;
use mneme_core::constants::MAX_SQL_IN_CHUNK;
use mneme_core::errors::{MnemeError, MnemeResult};
use mneme_core::models::{
    FeedbackDisagreement, FeedbackRating, MemRlQueryRecord, QValueDistribution, RankedCandidate,
};
use mneme_core::time::{from_millis, to_millis};
use mneme_core::traits::QUpdateRule;

use super::{placeholders, with_tx, write_err};
use crate::to_storage_err;

pub fn get_q_value(conn: &Connection, entry_id: &str) -> MnemeResult<Option<f64>> {
    conn.query_row(
        "SELECT q_value FROM memory_entries WHERE id = ?1",
        params![entry_id],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| to_storage_err(e.to_string()))
}

pub fn get_q_values(conn: &Connection, entry_ids: &[String]) -> MnemeResult<HashMap<String, f64>> {
    let mut map = HashMap::with_capacity(entry_ids.len());
    for chunk in entry_ids.chunks(MAX_SQL_IN_CHUNK) {
        let sql = format!(
            "SELECT id, q_value FROM memory_entries WHERE id IN ({})",
            placeholders(chunk.len())
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| to_storage_err(e.to_string()))?;
        let rows = stmt
            .query_map(params_from_iter(chunk.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })
            .map_err(|e| to_storage_err(e.to_string()))?;
        for row in rows {
            let (id, q) = row.map_err(|e| to_storage_err(e.to_string()))?;
            map.insert(id, q);
        }
    }
    Ok(map)
}

/// Read-modify-write every Q-value in one transaction. Rewards for the same
/// entry are applied in order, each seeing the previous result.
pub fn update_q_values(
    conn: &Connection,
    rewards: &[(String, f64)],
    rule: QUpdateRule<'_>,
) -> MnemeResult<HashMap<String, f64>> {
    with_tx(conn, "update_q_values", |conn| {
        let mut updated = HashMap::with_capacity(rewards.len());
        let mut write = conn
            .prepare_cached("UPDATE memory_entries SET q_value = ?2 WHERE id = ?1")
            .map_err(|e| to_storage_err(e.to_string()))?;
        for (entry_id, reward) in rewards {
            let Some(current) = get_q_value(conn, entry_id)? else {
                continue;
            };
            let next = rule(current, *reward);
            write
                .execute(params![entry_id, next])
                .map_err(write_err)?;
            updated.insert(entry_id.clone(), next);
        }
        Ok(updated)
    })
}

pub fn insert_query_record(conn: &Connection, record: &MemRlQueryRecord) -> MnemeResult<()> {
    let candidates = codec::encode(&record.candidates)?;
    conn.execute(
        "INSERT INTO memrl_queries (id, query_text, candidates, delta, lambda, has_feedback, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.id,
            record.query_text,
            candidates,
            record.delta,
            record.lambda,
            record.has_feedback as i64,
            to_millis(&record.created_at),
        ],
    )
    .map_err(write_err)?;
    Ok(())
}

pub fn get_query_record(conn: &Connection, id: &str) -> MnemeResult<Option<MemRlQueryRecord>> {
    let row = conn
        .query_row(
            "SELECT id, query_text, candidates, delta, lambda, has_feedback, created_at
             FROM memrl_queries WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, i64>(6)?,
                ))
            },
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    let Some((id, query_text, candidates, delta, lambda, has_feedback, created_at)) = row else {
        return Ok(None);
    };
    let candidates: Vec<RankedCandidate> = codec::decode(&candidates)?;
    Ok(Some(MemRlQueryRecord {
        id,
        query_text,
        candidates,
        delta,
        lambda,
        has_feedback: has_feedback != 0,
        created_at: from_millis(created_at),
    }))
}

/// Upsert the rating for `(query_id, auto)` and flag the query as rated.
pub fn upsert_feedback(conn: &Connection, rating: &FeedbackRating) -> MnemeResult<()> {
    with_tx(conn, "upsert_feedback", |conn| {
        let flagged = conn
            .execute(
                "UPDATE memrl_queries SET has_feedback = 1 WHERE id = ?1",
                params![rating.query_id],
            )
            .map_err(write_err)?;
        if flagged == 0 {
            return Err(MnemeError::QueryNotFound {
                id: rating.query_id.clone(),
            });
        }
        conn.execute(
            "INSERT INTO feedback_ratings (query_id, is_auto, score, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(query_id, is_auto) DO UPDATE SET
                score = excluded.score,
                created_at = excluded.created_at",
            params![
                rating.query_id,
                rating.auto as i64,
                rating.score,
                to_millis(&rating.created_at),
            ],
        )
        .map_err(write_err)?;
        Ok(())
    })
}

/// Ratings for a query, human first.
pub fn get_feedback(conn: &Connection, query_id: &str) -> MnemeResult<Vec<FeedbackRating>> {
    let mut stmt = conn
        .prepare(
            "SELECT query_id, is_auto, score, created_at
             FROM feedback_ratings WHERE query_id = ?1 ORDER BY is_auto",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let ratings = stmt
        .query_map(params![query_id], |row| {
            Ok(FeedbackRating {
                query_id: row.get(0)?,
                auto: row.get::<_, i64>(1)? != 0,
                score: row.get(2)?,
                created_at: from_millis(row.get(3)?),
            })
        })
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(ratings)
}

pub fn insert_disagreement(conn: &Connection, d: &FeedbackDisagreement) -> MnemeResult<()> {
    conn.execute(
        "INSERT INTO feedback_disagreements (query_id, auto_score, human_score, context, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            d.query_id,
            d.auto_score,
            d.human_score,
            d.context,
            to_millis(&d.created_at),
        ],
    )
    .map_err(write_err)?;
    Ok(())
}

/// Every recorded disagreement, oldest first.
pub fn list_disagreements(conn: &Connection) -> MnemeResult<Vec<FeedbackDisagreement>> {
    let mut stmt = conn
        .prepare(
            "SELECT query_id, auto_score, human_score, context, created_at
             FROM feedback_disagreements ORDER BY id",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(FeedbackDisagreement {
                query_id: row.get(0)?,
                auto_score: row.get(1)?,
                human_score: row.get(2)?,
                context: row.get(3)?,
                created_at: from_millis(row.get(4)?),
            })
        })
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(rows)
}

/// Bucket Q-values: low is `< low_below`, high is `>= high_from`.
pub fn q_value_distribution(
    conn: &Connection,
    low_below: f64,
    high_from: f64,
) -> MnemeResult<QValueDistribution> {
    let (low, high, total): (i64, i64, i64) = conn
        .query_row(
            "SELECT
                COALESCE(SUM(CASE WHEN q_value < ?1 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN q_value >= ?2 THEN 1 ELSE 0 END), 0),
                COUNT(*)
             FROM memory_entries",
            params![low_below, high_from],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(QValueDistribution {
        low: low as usize,
        medium: (total - low - high).max(0) as usize,
        high: high as usize,
    })
}

pub fn query_count(conn: &Connection) -> MnemeResult<usize> {
    count(conn, "SELECT COUNT(*) FROM memrl_queries")
}

pub fn count_without_feedback(conn: &Connection) -> MnemeResult<usize> {
    count(conn, "SELECT COUNT(*) FROM memrl_queries WHERE has_feedback = 0")
}

fn count(conn: &Connection, sql: &str) -> MnemeResult<usize> {
    let n: i64 = conn
        .query_row(sql, [], |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(n as usize)
}
