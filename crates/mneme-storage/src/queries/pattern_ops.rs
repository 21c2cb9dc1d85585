//! Pattern templates and their usage counters.

use rusqlite::{params, Connection, OptionalExtension, Row};

use mneme_core::codec;
use mneme_core::errors::{MnemeResult, PatternError};
use mneme_core::models::{PatternStats, PatternTemplate, SlotDefinition};
use mneme_core::time::{from_millis, to_millis};

use super::{is_constraint_violation, with_tx, write_err};
use crate::to_storage_err;

const TEMPLATE_COLUMNS: &str = "id, name, pattern, slots, priority, created_at, updated_at";

struct TemplateRow {
    id: String,
    name: String,
    pattern: String,
    slots: String,
    priority: i64,
    created_at: i64,
    updated_at: i64,
}

fn read_template(row: &Row<'_>) -> rusqlite::Result<TemplateRow> {
    Ok(TemplateRow {
        id: row.get(0)?,
        name: row.get(1)?,
        pattern: row.get(2)?,
        slots: row.get(3)?,
        priority: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn into_template(row: TemplateRow) -> MnemeResult<PatternTemplate> {
    let slots: Vec<SlotDefinition> = codec::decode(&row.slots)?;
    Ok(PatternTemplate {
        id: row.id,
        name: row.name,
        pattern: row.pattern,
        slots,
        priority: row.priority,
        created_at: from_millis(row.created_at),
        updated_at: from_millis(row.updated_at),
    })
}

fn read_stats(row: &Row<'_>) -> rusqlite::Result<PatternStats> {
    Ok(PatternStats {
        template_id: row.get(0)?,
        use_count: row.get::<_, i64>(1)? as u64,
        success_count: row.get::<_, i64>(2)? as u64,
        last_used_at: row.get::<_, Option<i64>>(3)?.map(from_millis),
    })
}

/// Name uniqueness violations surface as [`PatternError::DuplicateName`].
fn name_conflict(template: &PatternTemplate, e: rusqlite::Error) -> mneme_core::MnemeError {
    if is_constraint_violation(&e) && e.to_string().contains("pattern_templates.name") {
        PatternError::DuplicateName {
            name: template.name.clone(),
        }
        .into()
    } else {
        write_err(e)
    }
}

pub fn insert_template(conn: &Connection, template: &PatternTemplate) -> MnemeResult<()> {
    let slots = codec::encode(&template.slots)?;
    conn.execute(
        "INSERT INTO pattern_templates (id, name, pattern, slots, priority, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            template.id,
            template.name,
            template.pattern,
            slots,
            template.priority,
            to_millis(&template.created_at),
            to_millis(&template.updated_at),
        ],
    )
    .map_err(|e| name_conflict(template, e))?;
    Ok(())
}

pub fn update_template(conn: &Connection, template: &PatternTemplate) -> MnemeResult<bool> {
    let slots = codec::encode(&template.slots)?;
    let changed = conn
        .execute(
            "UPDATE pattern_templates
             SET name = ?2, pattern = ?3, slots = ?4, priority = ?5, updated_at = ?6
             WHERE id = ?1",
            params![
                template.id,
                template.name,
                template.pattern,
                slots,
                template.priority,
                to_millis(&template.updated_at),
            ],
        )
        .map_err(|e| name_conflict(template, e))?;
    Ok(changed > 0)
}

pub fn get_template(conn: &Connection, id: &str) -> MnemeResult<Option<PatternTemplate>> {
    query_one(
        conn,
        &format!("SELECT {TEMPLATE_COLUMNS} FROM pattern_templates WHERE id = ?1"),
        id,
    )
}

pub fn get_template_by_name(conn: &Connection, name: &str) -> MnemeResult<Option<PatternTemplate>> {
    query_one(
        conn,
        &format!("SELECT {TEMPLATE_COLUMNS} FROM pattern_templates WHERE name = ?1"),
        name,
    )
}

fn query_one(conn: &Connection, sql: &str, key: &str) -> MnemeResult<Option<PatternTemplate>> {
    conn.query_row(sql, params![key], read_template)
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?
        .map(into_template)
        .transpose()
}

/// Highest priority first, then by name.
pub fn list_templates(conn: &Connection) -> MnemeResult<Vec<PatternTemplate>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM pattern_templates ORDER BY priority DESC, name"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], read_template)
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.into_iter().map(into_template).collect()
}

/// Deletes the template; its stats row cascades.
pub fn delete_template(conn: &Connection, id: &str) -> MnemeResult<bool> {
    let changed = conn
        .execute("DELETE FROM pattern_templates WHERE id = ?1", params![id])
        .map_err(write_err)?;
    Ok(changed > 0)
}

/// Bump the use counter (and the success counter when `success`).
pub fn record_use(
    conn: &Connection,
    id: &str,
    success: bool,
    at: chrono::DateTime<chrono::Utc>,
) -> MnemeResult<Option<PatternStats>> {
    with_tx(conn, "record_use", |conn| {
        let exists = conn
            .query_row(
                "SELECT 1 FROM pattern_templates WHERE id = ?1",
                params![id],
                |_| Ok(()),
            )
            .optional()
            .map_err(|e| to_storage_err(e.to_string()))?
            .is_some();
        if !exists {
            return Ok(None);
        }
        conn.execute(
            "INSERT INTO pattern_stats (template_id, use_count, success_count, last_used_at)
             VALUES (?1, 1, ?2, ?3)
             ON CONFLICT(template_id) DO UPDATE SET
                use_count = use_count + 1,
                success_count = success_count + excluded.success_count,
                last_used_at = excluded.last_used_at",
            params![id, success as i64, to_millis(&at)],
        )
        .map_err(write_err)?;
        get_stats(conn, id)
    })
}

pub fn get_stats(conn: &Connection, id: &str) -> MnemeResult<Option<PatternStats>> {
    conn.query_row(
        "SELECT template_id, use_count, success_count, last_used_at
         FROM pattern_stats WHERE template_id = ?1",
        params![id],
        read_stats,
    )
    .optional()
    .map_err(|e| to_storage_err(e.to_string()))
}

pub fn get_all_stats(conn: &Connection) -> MnemeResult<Vec<PatternStats>> {
    let mut stmt = conn
        .prepare(
            "SELECT template_id, use_count, success_count, last_used_at
             FROM pattern_stats ORDER BY template_id",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let stats = stmt
        .query_map([], read_stats)
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(stats)
}

/// Templates used at least `min_uses` times whose success rate is below
/// `max_success_rate`. Never-used templates are never candidates.
pub fn get_prune_candidates(
    conn: &Connection,
    min_uses: u64,
    max_success_rate: f64,
) -> MnemeResult<Vec<PatternStats>> {
    let mut stmt = conn
        .prepare(
            "SELECT template_id, use_count, success_count, last_used_at
             FROM pattern_stats
             WHERE use_count > 0
               AND use_count >= ?1
               AND CAST(success_count AS REAL) / use_count < ?2
             ORDER BY CAST(success_count AS REAL) / use_count, template_id",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let stats = stmt
        .query_map(params![min_uses as i64, max_success_rate], read_stats)
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(stats)
}
