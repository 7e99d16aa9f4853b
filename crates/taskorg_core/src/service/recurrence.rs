//! Recurrence engine.
//!
//! # Responsibility
//! - Derive the next occurrence of completed recurring tasks.
//! - Materialize successors once per session from persisted state.
//!
//! # Invariants
//! - Only `completed` tasks with a recurrence spawn a successor.
//! - The successor id is `<id>_next` in the same project, status `pending`.
//! - One `Recur` audit row per materialized successor, none otherwise.
//! - A successor that already exists is skipped silently; repeat passes are
//!   no-ops.
//! - A task whose next due date is out of range is counted as failed and the
//!   pass continues with the remaining tasks.

use crate::model::date::DateError;
use crate::model::task::{Task, TaskStatus};
use crate::repo::task_repo::{SuccessorOutcome, TaskRepository};
use crate::repo::RepoResult;
use log::{debug, error, info};

const SUCCESSOR_SUFFIX: &str = "_next";

/// Counters from one recurrence pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecurrenceReport {
    /// Recurring tasks inspected.
    pub scanned: usize,
    /// Successors written.
    pub created: usize,
    /// Completed tasks whose successor already existed.
    pub skipped: usize,
    /// Completed tasks whose next due date could not be computed.
    pub failed: usize,
}

/// Returns the deterministic id of the successor of `task_id`.
pub fn successor_id(task_id: &str) -> String {
    format!("{task_id}{SUCCESSOR_SUFFIX}")
}

/// Builds the next occurrence of `task`, if it has one.
///
/// Returns `Ok(None)` for non-recurring or not-yet-completed tasks.
pub fn next_occurrence(task: &Task) -> Result<Option<Task>, DateError> {
    if task.status != TaskStatus::Completed {
        return Ok(None);
    }
    let Some(days) = task.recurrence.interval_days() else {
        return Ok(None);
    };

    let due_date = task.due_date.checked_add_days(days)?;
    Ok(Some(Task {
        id: successor_id(&task.id),
        description: task.description.clone(),
        due_date,
        status: TaskStatus::Pending,
        priority: task.priority,
        recurrence: task.recurrence,
        project_id: task.project_id.clone(),
    }))
}

/// Materializes successors for every completed recurring task.
///
/// Meant to run once at session start, before interactive use. Storage
/// errors abort the pass; date overflow on one task only skips that task.
pub fn handle_recurring_tasks<R>(repo: &mut R) -> RepoResult<RecurrenceReport>
where
    R: TaskRepository + ?Sized,
{
    let recurring = repo.list_recurring_tasks()?;
    let mut report = RecurrenceReport {
        scanned: recurring.len(),
        ..RecurrenceReport::default()
    };

    for task in &recurring {
        let successor = match next_occurrence(task) {
            Ok(Some(successor)) => successor,
            Ok(None) => continue,
            Err(err) => {
                report.failed += 1;
                error!(
                    "event=recurrence_spawn module=recurrence status=error project_id={} task_id={} error={}",
                    task.project_id, task.id, err
                );
                continue;
            }
        };

        match repo.add_recurrence_successor(&successor)? {
            SuccessorOutcome::Created => {
                report.created += 1;
                debug!(
                    "event=recurrence_spawn module=recurrence status=ok project_id={} task_id={} successor_id={}",
                    task.project_id, task.id, successor.id
                );
            }
            SuccessorOutcome::AlreadyExists => {
                report.skipped += 1;
                debug!(
                    "event=recurrence_spawn module=recurrence status=skip reason=exists project_id={} successor_id={}",
                    task.project_id, successor.id
                );
            }
        }
    }

    info!(
        "event=recurrence_pass module=recurrence status=ok scanned={} created={} skipped={} failed={}",
        report.scanned, report.created, report.skipped, report.failed
    );
    Ok(report)
}
