//! Task domain model.
//!
//! # Responsibility
//! - Define the task record, its enums and the merge-patch edit shape.
//! - Own the single derivation point for the display-only `overdue` status.
//!
//! # Invariants
//! - Persisted status is `pending` or `completed` only.
//! - `overdue` is derived from `(status, due_date, today)` and never stored.
//! - `(project_id, id)` identifies a task; `id` alone correlates history.

use crate::model::date::DueDate;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Stored task lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

/// Status as shown to users on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectiveStatus {
    Pending,
    Completed,
    /// Not completed and due before today.
    Overdue,
}

/// Task priority. Listing order is `High`, `Medium`, `Low`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// Repeat rule applied when a task is completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

impl Recurrence {
    /// Fixed day count added to the due date of the next occurrence.
    ///
    /// `Monthly` is a flat 30 days, not calendar-month aware.
    pub fn interval_days(self) -> Option<u32> {
        match self {
            Self::None => None,
            Self::Daily => Some(1),
            Self::Weekly => Some(7),
            Self::Monthly => Some(30),
        }
    }
}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Caller-assigned id, unique within its project.
    pub id: String,
    pub description: String,
    pub due_date: DueDate,
    pub status: TaskStatus,
    pub priority: Priority,
    pub recurrence: Recurrence,
    /// Owning project. Not checked for existence on insert.
    pub project_id: String,
}

impl Task {
    /// Creates a pending, medium-priority, non-recurring task.
    pub fn new(
        project_id: impl Into<String>,
        id: impl Into<String>,
        description: impl Into<String>,
        due_date: DueDate,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            due_date,
            status: TaskStatus::default(),
            priority: Priority::default(),
            recurrence: Recurrence::default(),
            project_id: project_id.into(),
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = recurrence;
        self
    }

    pub fn effective_status(&self, today: NaiveDate) -> EffectiveStatus {
        effective_status(self.status, self.due_date, today)
    }
}

/// Derives the display status of a task for `today`.
///
/// Both listing views and status counts go through this function.
pub fn effective_status(status: TaskStatus, due_date: DueDate, today: NaiveDate) -> EffectiveStatus {
    match status {
        TaskStatus::Completed => EffectiveStatus::Completed,
        TaskStatus::Pending if due_date.is_before(today) => EffectiveStatus::Overdue,
        TaskStatus::Pending => EffectiveStatus::Pending,
    }
}

/// Partial task update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub description: Option<String>,
    pub due_date: Option<DueDate>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub recurrence: Option<Recurrence>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.due_date.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.recurrence.is_none()
    }

    /// Returns `current` with every set field of this patch applied.
    pub fn merge_into(&self, current: &Task) -> Task {
        Task {
            id: current.id.clone(),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| current.description.clone()),
            due_date: self.due_date.unwrap_or(current.due_date),
            status: self.status.unwrap_or(current.status),
            priority: self.priority.unwrap_or(current.priority),
            recurrence: self.recurrence.unwrap_or(current.recurrence),
            project_id: current.project_id.clone(),
        }
    }
}

/// Per-project task totals by effective status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounts {
    pub pending: u32,
    pub completed: u32,
    pub overdue: u32,
}

impl TaskCounts {
    pub fn tally(&mut self, status: EffectiveStatus) {
        match status {
            EffectiveStatus::Pending => self.pending += 1,
            EffectiveStatus::Completed => self.completed += 1,
            EffectiveStatus::Overdue => self.overdue += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.pending + self.completed + self.overdue
    }
}
