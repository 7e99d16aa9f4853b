use chrono::NaiveDate;
use taskorg_core::{
    DueDate, EffectiveStatus, FixedClock, HistoryAction, NewTaskInput, Priority, Project,
    Recurrence, RepoError, SqliteTaskRepository, Task, TaskCounts, TaskOrganizer, TaskPatch,
    TaskRepository, TaskStatus,
};

fn organizer_on(year: i32, month: u32, day: u32) -> TaskOrganizer<SqliteTaskRepository, FixedClock> {
    let repo = SqliteTaskRepository::open_in_memory().unwrap();
    let today = NaiveDate::from_ymd_opt(year, month, day).unwrap();
    TaskOrganizer::with_clock(repo, FixedClock(today))
}

fn input(task_id: &str, due_date: &str) -> NewTaskInput {
    NewTaskInput {
        task_id: task_id.to_string(),
        description: format!("task {task_id}"),
        due_date: due_date.to_string(),
        priority: Priority::Medium,
        recurrence: Recurrence::None,
    }
}

#[test]
fn add_task_from_input_parses_due_date() {
    let mut organizer = organizer_on(2024, 1, 1);
    organizer.add_project("P", "Home").unwrap();

    let task = organizer
        .add_task_from_input("P", &input("T1", "02/29/2024"))
        .unwrap();

    assert_eq!(task.due_date, DueDate::parse("02/29/2024").unwrap());
    assert_eq!(organizer.repo().get_task("P", "T1").unwrap(), Some(task));
}

#[test]
fn malformed_input_date_leaves_storage_untouched() {
    let mut organizer = organizer_on(2024, 1, 1);
    organizer.add_project("P", "Home").unwrap();
    let history_before = organizer.history().unwrap().len();

    for text in ["13/01/2024", "02/30/2024", "2024-01-01", "1/1/2024", ""] {
        let err = organizer
            .add_task_from_input("P", &input("T1", text))
            .unwrap_err();
        assert!(matches!(err, RepoError::MalformedDate(_)), "accepted {text:?}");
    }

    assert!(organizer.repo().list_tasks("P").unwrap().is_empty());
    assert_eq!(organizer.history().unwrap().len(), history_before);
}

#[test]
fn task_views_carry_status_relative_to_the_clock() {
    let mut organizer = organizer_on(2024, 1, 10);
    organizer.add_project("P", "Home").unwrap();
    organizer
        .add_task_from_input("P", &input("late", "01/09/2024"))
        .unwrap();
    organizer
        .add_task_from_input("P", &input("due-today", "01/10/2024"))
        .unwrap();
    organizer
        .add_task_from_input("P", &input("done", "01/01/2024"))
        .unwrap();
    organizer.complete_task("P", "done").unwrap();

    let statuses = organizer
        .list_tasks_with_status("P")
        .unwrap()
        .into_iter()
        .map(|view| (view.task.id, view.status))
        .collect::<Vec<_>>();
    assert_eq!(
        statuses,
        vec![
            ("late".to_string(), EffectiveStatus::Overdue),
            ("due-today".to_string(), EffectiveStatus::Pending),
            ("done".to_string(), EffectiveStatus::Completed),
        ]
    );

    let stored = organizer.repo().get_task("P", "late").unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Pending);
}

#[test]
fn project_summaries_report_counts_per_project() {
    let mut organizer = organizer_on(2024, 6, 1);
    organizer.add_project("P", "Home").unwrap();
    organizer.add_project("Q", "Work").unwrap();
    organizer
        .add_task_from_input("P", &input("T1", "01/01/2024"))
        .unwrap();
    organizer
        .add_task_from_input("P", &input("T2", "12/01/2024"))
        .unwrap();
    organizer
        .add_task_from_input("Q", &input("T1", "12/01/2024"))
        .unwrap();
    organizer.complete_task("Q", "T1").unwrap();

    let summaries = organizer.project_summaries().unwrap();

    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].project, Project::new("P", "Home"));
    assert_eq!(
        summaries[0].counts,
        TaskCounts {
            pending: 1,
            completed: 0,
            overdue: 1,
        }
    );
    assert_eq!(
        summaries[1].counts,
        TaskCounts {
            pending: 0,
            completed: 1,
            overdue: 0,
        }
    );
    assert_eq!(organizer.task_counts("Q").unwrap(), summaries[1].counts);
}

#[test]
fn start_session_runs_the_recurrence_pass() {
    let mut organizer = organizer_on(2024, 1, 1);
    organizer.add_project("P", "Home").unwrap();
    let recurring = NewTaskInput {
        recurrence: Recurrence::Daily,
        ..input("T1", "01/01/2024")
    };
    organizer.add_task_from_input("P", &recurring).unwrap();
    organizer.complete_task("P", "T1").unwrap();

    let first = organizer.start_session().unwrap();
    let second = organizer.start_session().unwrap();

    assert_eq!(first.created, 1);
    assert_eq!(second.created, 0);
    assert_eq!(second.skipped, 1);
    assert_eq!(organizer.history().unwrap()[0].action, HistoryAction::Recur);
    assert!(organizer.repo().get_task("P", "T1_next").unwrap().is_some());
}

#[test]
fn edit_and_delete_flow_through_the_service() {
    let mut organizer = organizer_on(2024, 1, 1);
    organizer.add_project("P", "Home").unwrap();
    organizer
        .add_task(
            "P",
            &Task::new("P", "T1", "draft", DueDate::parse("01/05/2024").unwrap()),
        )
        .unwrap();

    let patch = TaskPatch {
        priority: Some(Priority::High),
        ..TaskPatch::default()
    };
    assert!(organizer.edit_task("P", "T1", &patch).unwrap());
    assert!(!organizer.edit_task("P", "missing", &patch).unwrap());
    assert_eq!(
        organizer.get_task("P", "T1").unwrap().unwrap().priority,
        Priority::High
    );
    assert_eq!(organizer.list_tasks("P").unwrap().len(), 1);
    assert_eq!(
        organizer.get_project("P").unwrap(),
        Some(Project::new("P", "Home"))
    );
    assert_eq!(organizer.search_tasks("raf").unwrap().len(), 1);
    assert_eq!(organizer.search_projects("om").unwrap().len(), 1);

    organizer.delete_task("P", "T1").unwrap();
    assert!(organizer.list_tasks_with_status("P").unwrap().is_empty());

    organizer.delete_project("P").unwrap();
    assert!(organizer.list_projects().unwrap().is_empty());

    let repo = organizer.into_repo();
    assert_eq!(
        repo.fetch_history().unwrap()[0].details,
        "Project P deleted"
    );
}
