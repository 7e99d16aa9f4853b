//! Core persistence and query layer for the task organizer.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::date::{validate_date, DateError, DueDate};
pub use model::history::{EntityType, HistoryAction, HistoryRecord};
pub use model::project::Project;
pub use model::task::{
    effective_status, EffectiveStatus, Priority, Recurrence, Task, TaskCounts, TaskPatch,
    TaskStatus,
};
pub use repo::task_repo::{SqliteTaskRepository, SuccessorOutcome, TaskRepository};
pub use repo::{RepoError, RepoResult};
pub use service::clock::{Clock, FixedClock, SystemClock};
pub use service::organizer_service::{NewTaskInput, ProjectSummary, TaskOrganizer, TaskView};
pub use service::recurrence::{
    handle_recurring_tasks, next_occurrence, successor_id, RecurrenceReport,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
