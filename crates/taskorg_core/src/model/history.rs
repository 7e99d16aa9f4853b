//! Audit history records.
//!
//! # Invariants
//! - Records are append-only; nothing updates or deletes them.
//! - Records carry no foreign keys and outlive the entities they name.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Kind of entity a history record refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Project,
    Task,
}

impl Display for EntityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Project => f.write_str("project"),
            Self::Task => f.write_str("task"),
        }
    }
}

/// Mutation recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Add,
    Edit,
    Complete,
    Delete,
    /// Successor of a completed recurring task was materialized.
    Recur,
}

/// One persisted audit row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Store-assigned sequence number.
    pub id: i64,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub action: HistoryAction,
    pub details: String,
    /// UTC creation instant in epoch milliseconds, generated by the store.
    pub created_at: i64,
}
