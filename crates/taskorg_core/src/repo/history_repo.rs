//! Append-only audit log over the `history` relation.
//!
//! # Responsibility
//! - Append one row per mutating operation.
//! - Return snapshots of the log, newest first.
//!
//! # Invariants
//! - Rows are never updated or deleted.
//! - `created_at` is generated by the store, not the caller.
//! - Writers pass the transaction of the primary write so both commit
//!   together.

use crate::model::history::{EntityType, HistoryAction, HistoryRecord};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const HISTORY_SELECT_SQL: &str = "SELECT
    id,
    entity_type,
    entity_id,
    action,
    details,
    created_at
FROM history";

/// Appends one audit row and returns its sequence id.
pub fn record(
    conn: &Connection,
    entity_type: EntityType,
    entity_id: &str,
    action: HistoryAction,
    details: &str,
) -> RepoResult<i64> {
    conn.execute(
        "INSERT INTO history (entity_type, entity_id, action, details)
         VALUES (?1, ?2, ?3, ?4);",
        params![
            entity_type_to_db(entity_type),
            entity_id,
            action_to_db(action),
            details,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Returns every audit row, newest first.
pub fn fetch_all(conn: &Connection) -> RepoResult<Vec<HistoryRecord>> {
    let mut stmt = conn.prepare(&format!(
        "{HISTORY_SELECT_SQL} ORDER BY created_at DESC, id DESC;"
    ))?;
    let mut rows = stmt.query([])?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(parse_history_row(row)?);
    }
    Ok(records)
}

/// Returns audit rows for one entity, newest first.
pub fn fetch_for_entity(
    conn: &Connection,
    entity_type: EntityType,
    entity_id: &str,
) -> RepoResult<Vec<HistoryRecord>> {
    let mut stmt = conn.prepare(&format!(
        "{HISTORY_SELECT_SQL}
         WHERE entity_type = ?1
           AND entity_id = ?2
         ORDER BY created_at DESC, id DESC;"
    ))?;
    let mut rows = stmt.query(params![entity_type_to_db(entity_type), entity_id])?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(parse_history_row(row)?);
    }
    Ok(records)
}

fn parse_history_row(row: &Row<'_>) -> RepoResult<HistoryRecord> {
    let type_text: String = row.get("entity_type")?;
    let entity_type = parse_entity_type(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid entity type `{type_text}` in history.entity_type"
        ))
    })?;

    let action_text: String = row.get("action")?;
    let action = parse_action(&action_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid action `{action_text}` in history.action"))
    })?;

    Ok(HistoryRecord {
        id: row.get("id")?,
        entity_type,
        entity_id: row.get("entity_id")?,
        action,
        details: row.get("details")?,
        created_at: row.get("created_at")?,
    })
}

fn entity_type_to_db(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::Project => "Project",
        EntityType::Task => "Task",
    }
}

fn parse_entity_type(value: &str) -> Option<EntityType> {
    match value {
        "Project" => Some(EntityType::Project),
        "Task" => Some(EntityType::Task),
        _ => None,
    }
}

fn action_to_db(action: HistoryAction) -> &'static str {
    match action {
        HistoryAction::Add => "Add",
        HistoryAction::Edit => "Edit",
        HistoryAction::Complete => "Complete",
        HistoryAction::Delete => "Delete",
        HistoryAction::Recur => "Recur",
    }
}

fn parse_action(value: &str) -> Option<HistoryAction> {
    match value {
        "Add" => Some(HistoryAction::Add),
        "Edit" => Some(HistoryAction::Edit),
        "Complete" => Some(HistoryAction::Complete),
        "Delete" => Some(HistoryAction::Delete),
        "Recur" => Some(HistoryAction::Recur),
        _ => None,
    }
}
