//! Project/task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and query APIs over `projects` and `tasks`.
//! - Append the matching audit row for every mutation.
//!
//! # Invariants
//! - Each mutation runs in one `IMMEDIATE` transaction together with its
//!   audit row; an error drops the transaction and rolls both back.
//! - Task listing order is `high, medium, low`, ties by insertion order.
//! - `add_task` does not check that the owning project exists.
//! - Deletes of absent rows are successful no-ops.

use crate::db::migrations::{latest_version, schema_version};
use crate::db::{open_db, open_db_in_memory};
use crate::model::date::DueDate;
use crate::model::history::{EntityType, HistoryAction, HistoryRecord};
use crate::model::project::Project;
use crate::model::task::{Priority, Recurrence, Task, TaskCounts, TaskPatch, TaskStatus};
use crate::repo::{history_repo, map_insert_error, RepoError, RepoResult};
use chrono::NaiveDate;
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;

const TASK_SELECT_SQL: &str = "SELECT
    project_id,
    id,
    description,
    due_date,
    status,
    priority,
    recurrence
FROM tasks";

const TASK_PRIORITY_ORDER_SQL: &str = "ORDER BY
    CASE priority
        WHEN 'high' THEN 1
        WHEN 'medium' THEN 2
        WHEN 'low' THEN 3
        ELSE 4
    END,
    rowid ASC";

const LIKE_ESCAPE: char = '\\';

/// Result of trying to materialize a recurrence successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessorOutcome {
    /// Successor row and its `Recur` audit row were written.
    Created,
    /// A task with the successor id already exists; nothing was written.
    AlreadyExists,
}

/// Repository interface for project and task operations.
pub trait TaskRepository {
    /// Inserts a project keyed by its caller-assigned id.
    fn add_project(&mut self, project: &Project) -> RepoResult<()>;
    fn get_project(&self, project_id: &str) -> RepoResult<Option<Project>>;
    /// Lists projects in insertion order.
    fn list_projects(&self) -> RepoResult<Vec<Project>>;
    /// Substring match on project name.
    fn search_projects(&self, keyword: &str) -> RepoResult<Vec<Project>>;
    /// Deletes a project and all of its tasks.
    fn delete_project(&mut self, project_id: &str) -> RepoResult<()>;

    /// Inserts `task` under `project_id`.
    fn add_task(&mut self, project_id: &str, task: &Task) -> RepoResult<()>;
    fn get_task(&self, project_id: &str, task_id: &str) -> RepoResult<Option<Task>>;
    /// Applies a merge-patch. Returns `false` when the task does not exist.
    /// An empty patch writes no field but still records `Edit`.
    fn edit_task(&mut self, project_id: &str, task_id: &str, patch: &TaskPatch)
        -> RepoResult<bool>;
    fn mark_task_completed(&mut self, project_id: &str, task_id: &str) -> RepoResult<()>;
    /// Lists a project's tasks by priority.
    fn list_tasks(&self, project_id: &str) -> RepoResult<Vec<Task>>;
    /// Substring match on task description across all projects.
    fn search_tasks(&self, keyword: &str) -> RepoResult<Vec<Task>>;
    /// Counts a project's tasks by effective status on `today`.
    fn get_task_counts(&self, project_id: &str, today: NaiveDate) -> RepoResult<TaskCounts>;
    fn delete_task(&mut self, project_id: &str, task_id: &str) -> RepoResult<()>;

    /// Lists every task whose recurrence is not `none`.
    fn list_recurring_tasks(&self) -> RepoResult<Vec<Task>>;
    /// Inserts a recurrence successor and its `Recur` audit row, unless a
    /// task with the same identity already exists.
    fn add_recurrence_successor(&mut self, successor: &Task) -> RepoResult<SuccessorOutcome>;

    /// Returns the audit log, newest first.
    fn fetch_history(&self) -> RepoResult<Vec<HistoryRecord>>;
}

/// SQLite-backed repository that owns the store connection.
pub struct SqliteTaskRepository {
    conn: Connection,
}

impl SqliteTaskRepository {
    /// Wraps a provisioned connection.
    ///
    /// Fails with `UninitializedStore` when the schema was not provisioned by
    /// [`crate::db::open_db`] or [`crate::db::open_db_in_memory`].
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        ensure_connection_ready(&conn)?;
        Ok(Self { conn })
    }

    /// Opens the store file at `path` and wraps it.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Opens a fresh in-memory store and wraps it.
    pub fn open_in_memory() -> RepoResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    /// Read access to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Releases the connection back to the caller.
    pub fn into_inner(self) -> Connection {
        self.conn
    }

    /// Returns audit rows for one entity, newest first.
    pub fn fetch_history_for(
        &self,
        entity_type: EntityType,
        entity_id: &str,
    ) -> RepoResult<Vec<HistoryRecord>> {
        history_repo::fetch_for_entity(&self.conn, entity_type, entity_id)
    }

    fn query_tasks(&self, sql: &str, params: impl rusqlite::Params) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn query_projects(&self, sql: &str, params: impl rusqlite::Params) -> RepoResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(Project {
                id: row.get("id")?,
                name: row.get("name")?,
            });
        }
        Ok(projects)
    }
}

impl TaskRepository for SqliteTaskRepository {
    fn add_project(&mut self, project: &Project) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO projects (id, name) VALUES (?1, ?2);",
            params![project.id.as_str(), project.name.as_str()],
        )
        .map_err(|err| map_insert_error(err, EntityType::Project, &project.id))?;
        history_repo::record(
            &tx,
            EntityType::Project,
            &project.id,
            HistoryAction::Add,
            &format!("Added project {}", project.name),
        )?;
        tx.commit()?;

        info!(
            "event=project_add module=repo status=ok project_id={}",
            project.id
        );
        Ok(())
    }

    fn get_project(&self, project_id: &str) -> RepoResult<Option<Project>> {
        let project = self
            .conn
            .query_row(
                "SELECT id, name FROM projects WHERE id = ?1;",
                [project_id],
                |row| {
                    Ok(Project {
                        id: row.get("id")?,
                        name: row.get("name")?,
                    })
                },
            )
            .optional()?;
        Ok(project)
    }

    fn list_projects(&self) -> RepoResult<Vec<Project>> {
        self.query_projects("SELECT id, name FROM projects ORDER BY rowid ASC;", [])
    }

    fn search_projects(&self, keyword: &str) -> RepoResult<Vec<Project>> {
        self.query_projects(
            "SELECT id, name
             FROM projects
             WHERE name LIKE ?1 ESCAPE '\\'
             ORDER BY rowid ASC;",
            [like_pattern(keyword)],
        )
    }

    fn delete_project(&mut self, project_id: &str) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let removed_tasks = tx.execute("DELETE FROM tasks WHERE project_id = ?1;", [project_id])?;
        let removed_projects = tx.execute("DELETE FROM projects WHERE id = ?1;", [project_id])?;
        history_repo::record(
            &tx,
            EntityType::Project,
            project_id,
            HistoryAction::Delete,
            &format!("Project {project_id} deleted"),
        )?;
        tx.commit()?;

        info!(
            "event=project_delete module=repo status=ok project_id={} removed_projects={} removed_tasks={}",
            project_id, removed_projects, removed_tasks
        );
        Ok(())
    }

    fn add_task(&mut self, project_id: &str, task: &Task) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        insert_task_row(&tx, project_id, task)?;
        history_repo::record(
            &tx,
            EntityType::Task,
            &task.id,
            HistoryAction::Add,
            &format!("Added task {}", task.description),
        )?;
        tx.commit()?;

        info!(
            "event=task_add module=repo status=ok project_id={} task_id={}",
            project_id, task.id
        );
        Ok(())
    }

    fn get_task(&self, project_id: &str, task_id: &str) -> RepoResult<Option<Task>> {
        load_task(&self.conn, project_id, task_id)
    }

    fn edit_task(
        &mut self,
        project_id: &str,
        task_id: &str,
        patch: &TaskPatch,
    ) -> RepoResult<bool> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(current) = load_task(&tx, project_id, task_id)? else {
            debug!(
                "event=task_edit module=repo status=skip reason=not_found project_id={} task_id={}",
                project_id, task_id
            );
            return Ok(false);
        };

        if !patch.is_empty() {
            let merged = patch.merge_into(&current);
            tx.execute(
                "UPDATE tasks
                 SET
                    description = ?1,
                    due_date = ?2,
                    status = ?3,
                    priority = ?4,
                    recurrence = ?5
                 WHERE project_id = ?6
                   AND id = ?7;",
                params![
                    merged.description.as_str(),
                    merged.due_date.to_string(),
                    task_status_to_db(merged.status),
                    priority_to_db(merged.priority),
                    recurrence_to_db(merged.recurrence),
                    project_id,
                    task_id,
                ],
            )?;
        }
        history_repo::record(
            &tx,
            EntityType::Task,
            task_id,
            HistoryAction::Edit,
            &format!("Task {task_id} edited"),
        )?;
        tx.commit()?;

        info!(
            "event=task_edit module=repo status=ok project_id={} task_id={}",
            project_id, task_id
        );
        Ok(true)
    }

    fn mark_task_completed(&mut self, project_id: &str, task_id: &str) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE tasks
             SET status = ?1
             WHERE project_id = ?2
               AND id = ?3;",
            params![task_status_to_db(TaskStatus::Completed), project_id, task_id],
        )?;
        history_repo::record(
            &tx,
            EntityType::Task,
            task_id,
            HistoryAction::Complete,
            &format!("Task {task_id} marked as completed"),
        )?;
        tx.commit()?;

        info!(
            "event=task_complete module=repo status=ok project_id={} task_id={} changed={}",
            project_id, task_id, changed
        );
        Ok(())
    }

    fn list_tasks(&self, project_id: &str) -> RepoResult<Vec<Task>> {
        self.query_tasks(
            &format!("{TASK_SELECT_SQL} WHERE project_id = ?1 {TASK_PRIORITY_ORDER_SQL};"),
            [project_id],
        )
    }

    fn search_tasks(&self, keyword: &str) -> RepoResult<Vec<Task>> {
        self.query_tasks(
            &format!("{TASK_SELECT_SQL} WHERE description LIKE ?1 ESCAPE '\\' ORDER BY rowid ASC;"),
            [like_pattern(keyword)],
        )
    }

    fn get_task_counts(&self, project_id: &str, today: NaiveDate) -> RepoResult<TaskCounts> {
        let tasks = self.query_tasks(
            &format!("{TASK_SELECT_SQL} WHERE project_id = ?1;"),
            [project_id],
        )?;
        let mut counts = TaskCounts::default();
        for task in &tasks {
            counts.tally(task.effective_status(today));
        }
        Ok(counts)
    }

    fn delete_task(&mut self, project_id: &str, task_id: &str) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let removed = tx.execute(
            "DELETE FROM tasks WHERE project_id = ?1 AND id = ?2;",
            [project_id, task_id],
        )?;
        history_repo::record(
            &tx,
            EntityType::Task,
            task_id,
            HistoryAction::Delete,
            &format!("Task {task_id} deleted"),
        )?;
        tx.commit()?;

        info!(
            "event=task_delete module=repo status=ok project_id={} task_id={} removed={}",
            project_id, task_id, removed
        );
        Ok(())
    }

    fn list_recurring_tasks(&self) -> RepoResult<Vec<Task>> {
        self.query_tasks(
            &format!("{TASK_SELECT_SQL} WHERE recurrence != 'none' ORDER BY rowid ASC;"),
            [],
        )
    }

    fn add_recurrence_successor(&mut self, successor: &Task) -> RepoResult<SuccessorOutcome> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if task_exists(&tx, &successor.project_id, &successor.id)? {
            return Ok(SuccessorOutcome::AlreadyExists);
        }

        insert_task_row(&tx, &successor.project_id, successor)?;
        history_repo::record(
            &tx,
            EntityType::Task,
            &successor.id,
            HistoryAction::Recur,
            &format!(
                "New task {} created based on recurrence settings",
                successor.id
            ),
        )?;
        tx.commit()?;
        Ok(SuccessorOutcome::Created)
    }

    fn fetch_history(&self) -> RepoResult<Vec<HistoryRecord>> {
        history_repo::fetch_all(&self.conn)
    }
}

fn insert_task_row(conn: &Connection, project_id: &str, task: &Task) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO tasks (
            project_id,
            id,
            description,
            due_date,
            status,
            priority,
            recurrence
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            project_id,
            task.id.as_str(),
            task.description.as_str(),
            task.due_date.to_string(),
            task_status_to_db(task.status),
            priority_to_db(task.priority),
            recurrence_to_db(task.recurrence),
        ],
    )
    .map_err(|err| map_insert_error(err, EntityType::Task, &task.id))?;
    Ok(())
}

fn load_task(conn: &Connection, project_id: &str, task_id: &str) -> RepoResult<Option<Task>> {
    let mut stmt = conn.prepare(&format!(
        "{TASK_SELECT_SQL} WHERE project_id = ?1 AND id = ?2;"
    ))?;
    let mut rows = stmt.query([project_id, task_id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_task_row(row)?));
    }
    Ok(None)
}

fn task_exists(conn: &Connection, project_id: &str, task_id: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM tasks
            WHERE project_id = ?1 AND id = ?2
        );",
        [project_id, task_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let due_text: String = row.get("due_date")?;
    let due_date = DueDate::parse(&due_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid due date `{due_text}` in tasks.due_date"))
    })?;

    let status_text: String = row.get("status")?;
    let status = parse_task_status(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid task status `{status_text}` in tasks.status"))
    })?;

    let priority_text: String = row.get("priority")?;
    let priority = parse_priority(&priority_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid priority `{priority_text}` in tasks.priority"))
    })?;

    let recurrence_text: String = row.get("recurrence")?;
    let recurrence = parse_recurrence(&recurrence_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid recurrence `{recurrence_text}` in tasks.recurrence"
        ))
    })?;

    Ok(Task {
        id: row.get("id")?,
        description: row.get("description")?,
        due_date,
        status,
        priority,
        recurrence,
        project_id: row.get("project_id")?,
    })
}

/// Builds a `LIKE` pattern matching `keyword` literally anywhere in a value.
fn like_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for ch in keyword.chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version = schema_version(conn)?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedStore {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

fn task_status_to_db(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "pending",
        TaskStatus::Completed => "completed",
    }
}

fn parse_task_status(value: &str) -> Option<TaskStatus> {
    match value {
        "pending" => Some(TaskStatus::Pending),
        "completed" => Some(TaskStatus::Completed),
        _ => None,
    }
}

fn priority_to_db(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "low",
        Priority::Medium => "medium",
        Priority::High => "high",
    }
}

fn parse_priority(value: &str) -> Option<Priority> {
    match value {
        "low" => Some(Priority::Low),
        "medium" => Some(Priority::Medium),
        "high" => Some(Priority::High),
        _ => None,
    }
}

fn recurrence_to_db(recurrence: Recurrence) -> &'static str {
    match recurrence {
        Recurrence::None => "none",
        Recurrence::Daily => "daily",
        Recurrence::Weekly => "weekly",
        Recurrence::Monthly => "monthly",
    }
}

fn parse_recurrence(value: &str) -> Option<Recurrence> {
    match value {
        "none" => Some(Recurrence::None),
        "daily" => Some(Recurrence::Daily),
        "weekly" => Some(Recurrence::Weekly),
        "monthly" => Some(Recurrence::Monthly),
        _ => None,
    }
}
