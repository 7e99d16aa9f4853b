//! Organizer use-case service.
//!
//! # Responsibility
//! - Provide the operation set consumed by front ends (CLI, tests).
//! - Attach clock-derived effective status to task views and counts.
//! - Parse boundary date text before anything reaches storage.
//!
//! # Invariants
//! - Service APIs never bypass repository persistence contracts.
//! - "Today" comes from the injected `Clock` only.

use crate::model::date::DueDate;
use crate::model::history::HistoryRecord;
use crate::model::project::Project;
use crate::model::task::{EffectiveStatus, Priority, Recurrence, Task, TaskCounts, TaskPatch};
use crate::repo::task_repo::TaskRepository;
use crate::repo::RepoResult;
use crate::service::clock::{Clock, SystemClock};
use crate::service::recurrence::{handle_recurring_tasks, RecurrenceReport};
use chrono::NaiveDate;

/// Task paired with its effective status for the service's current day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskView {
    pub task: Task,
    pub status: EffectiveStatus,
}

/// Project with its task totals, as shown in the organizer header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    pub project: Project,
    pub counts: TaskCounts,
}

/// Boundary input for creating a task from user-entered text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskInput {
    pub task_id: String,
    pub description: String,
    /// `MM/DD/YYYY` text.
    pub due_date: String,
    pub priority: Priority,
    pub recurrence: Recurrence,
}

/// Service facade over a task repository and a clock.
pub struct TaskOrganizer<R: TaskRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
}

impl<R: TaskRepository> TaskOrganizer<R, SystemClock> {
    /// Creates a service that reads "today" from the host clock.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: TaskRepository, C: Clock> TaskOrganizer<R, C> {
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn into_repo(self) -> R {
        self.repo
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Runs the once-per-session recurrence pass.
    pub fn start_session(&mut self) -> RepoResult<RecurrenceReport> {
        handle_recurring_tasks(&mut self.repo)
    }

    pub fn add_project(
        &mut self,
        project_id: impl Into<String>,
        name: impl Into<String>,
    ) -> RepoResult<Project> {
        let project = Project::new(project_id, name);
        self.repo.add_project(&project)?;
        Ok(project)
    }

    pub fn add_task(&mut self, project_id: &str, task: &Task) -> RepoResult<()> {
        self.repo.add_task(project_id, task)
    }

    /// Creates a task from boundary text.
    ///
    /// Fails with `MalformedDate` before touching storage when the due date
    /// text is not a valid `MM/DD/YYYY` date.
    pub fn add_task_from_input(
        &mut self,
        project_id: &str,
        input: &NewTaskInput,
    ) -> RepoResult<Task> {
        let due_date = DueDate::parse(&input.due_date)?;
        let task = Task::new(
            project_id,
            input.task_id.as_str(),
            input.description.as_str(),
            due_date,
        )
        .with_priority(input.priority)
        .with_recurrence(input.recurrence);
        self.repo.add_task(project_id, &task)?;
        Ok(task)
    }

    /// Applies a merge-patch; `Ok(false)` means the task was not found.
    pub fn edit_task(
        &mut self,
        project_id: &str,
        task_id: &str,
        patch: &TaskPatch,
    ) -> RepoResult<bool> {
        self.repo.edit_task(project_id, task_id, patch)
    }

    pub fn complete_task(&mut self, project_id: &str, task_id: &str) -> RepoResult<()> {
        self.repo.mark_task_completed(project_id, task_id)
    }

    pub fn delete_task(&mut self, project_id: &str, task_id: &str) -> RepoResult<()> {
        self.repo.delete_task(project_id, task_id)
    }

    pub fn delete_project(&mut self, project_id: &str) -> RepoResult<()> {
        self.repo.delete_project(project_id)
    }

    pub fn get_project(&self, project_id: &str) -> RepoResult<Option<Project>> {
        self.repo.get_project(project_id)
    }

    pub fn get_task(&self, project_id: &str, task_id: &str) -> RepoResult<Option<Task>> {
        self.repo.get_task(project_id, task_id)
    }

    /// Lists a project's tasks by priority, without status decoration.
    pub fn list_tasks(&self, project_id: &str) -> RepoResult<Vec<Task>> {
        self.repo.list_tasks(project_id)
    }

    pub fn list_projects(&self) -> RepoResult<Vec<Project>> {
        self.repo.list_projects()
    }

    pub fn search_projects(&self, keyword: &str) -> RepoResult<Vec<Project>> {
        self.repo.search_projects(keyword)
    }

    pub fn search_tasks(&self, keyword: &str) -> RepoResult<Vec<Task>> {
        self.repo.search_tasks(keyword)
    }

    /// Lists a project's tasks by priority with their effective status.
    pub fn list_tasks_with_status(&self, project_id: &str) -> RepoResult<Vec<TaskView>> {
        let today = self.today();
        let tasks = self.repo.list_tasks(project_id)?;
        Ok(tasks
            .into_iter()
            .map(|task| {
                let status = task.effective_status(today);
                TaskView { task, status }
            })
            .collect())
    }

    pub fn task_counts(&self, project_id: &str) -> RepoResult<TaskCounts> {
        self.repo.get_task_counts(project_id, self.today())
    }

    /// Returns every project with its counts for today.
    pub fn project_summaries(&self) -> RepoResult<Vec<ProjectSummary>> {
        let today = self.today();
        self.repo
            .list_projects()?
            .into_iter()
            .map(|project| {
                let counts = self.repo.get_task_counts(&project.id, today)?;
                Ok(ProjectSummary { project, counts })
            })
            .collect()
    }

    pub fn history(&self) -> RepoResult<Vec<HistoryRecord>> {
        self.repo.fetch_history()
    }
}
