use taskorg_core::repo::history_repo;
use taskorg_core::{
    DueDate, EntityType, HistoryAction, Project, RepoError, SqliteTaskRepository, Task,
    TaskPatch, TaskRepository,
};

fn task(id: &str) -> Task {
    Task::new("P", id, format!("task {id}"), DueDate::parse("01/01/2024").unwrap())
}

fn actions(repo: &SqliteTaskRepository) -> Vec<(EntityType, String, HistoryAction)> {
    repo.fetch_history()
        .unwrap()
        .into_iter()
        .map(|record| (record.entity_type, record.entity_id, record.action))
        .collect()
}

#[test]
fn every_mutation_appends_exactly_one_record() {
    let mut repo = SqliteTaskRepository::open_in_memory().unwrap();

    repo.add_project(&Project::new("P", "Home")).unwrap();
    assert_eq!(repo.fetch_history().unwrap().len(), 1);

    repo.add_task("P", &task("T1")).unwrap();
    assert_eq!(repo.fetch_history().unwrap().len(), 2);

    let patch = TaskPatch {
        description: Some("renamed".to_string()),
        ..TaskPatch::default()
    };
    assert!(repo.edit_task("P", "T1", &patch).unwrap());
    assert_eq!(repo.fetch_history().unwrap().len(), 3);

    repo.mark_task_completed("P", "T1").unwrap();
    assert_eq!(repo.fetch_history().unwrap().len(), 4);

    repo.delete_task("P", "T1").unwrap();
    assert_eq!(repo.fetch_history().unwrap().len(), 5);

    repo.delete_project("P").unwrap();
    assert_eq!(repo.fetch_history().unwrap().len(), 6);

    assert_eq!(
        actions(&repo),
        vec![
            (EntityType::Project, "P".to_string(), HistoryAction::Delete),
            (EntityType::Task, "T1".to_string(), HistoryAction::Delete),
            (EntityType::Task, "T1".to_string(), HistoryAction::Complete),
            (EntityType::Task, "T1".to_string(), HistoryAction::Edit),
            (EntityType::Task, "T1".to_string(), HistoryAction::Add),
            (EntityType::Project, "P".to_string(), HistoryAction::Add),
        ]
    );
}

#[test]
fn cascade_delete_logs_only_the_project() {
    let mut repo = SqliteTaskRepository::open_in_memory().unwrap();
    repo.add_project(&Project::new("P", "Home")).unwrap();
    repo.add_task("P", &task("T1")).unwrap();
    repo.add_task("P", &task("T2")).unwrap();
    let before = repo.fetch_history().unwrap().len();

    repo.delete_project("P").unwrap();

    let history = repo.fetch_history().unwrap();
    assert_eq!(history.len(), before + 1);
    assert_eq!(history[0].entity_type, EntityType::Project);
    assert_eq!(history[0].action, HistoryAction::Delete);
}

#[test]
fn records_carry_descriptive_details() {
    let mut repo = SqliteTaskRepository::open_in_memory().unwrap();
    repo.add_project(&Project::new("P", "Home")).unwrap();
    repo.add_task("P", &task("T1")).unwrap();
    repo.mark_task_completed("P", "T1").unwrap();

    let details = repo
        .fetch_history()
        .unwrap()
        .into_iter()
        .map(|record| record.details)
        .collect::<Vec<_>>();
    assert_eq!(
        details,
        vec![
            "Task T1 marked as completed".to_string(),
            "Added task task T1".to_string(),
            "Added project Home".to_string(),
        ]
    );
}

#[test]
fn history_is_newest_first_with_increasing_ids_and_timestamps() {
    let mut repo = SqliteTaskRepository::open_in_memory().unwrap();
    repo.add_project(&Project::new("P", "Home")).unwrap();
    repo.add_task("P", &task("T1")).unwrap();
    repo.add_task("P", &task("T2")).unwrap();

    let history = repo.fetch_history().unwrap();
    assert_eq!(history.len(), 3);
    for pair in history.windows(2) {
        assert!(pair[0].id > pair[1].id);
        assert!(pair[0].created_at >= pair[1].created_at);
    }
    assert!(history.iter().all(|record| record.created_at > 0));
}

#[test]
fn fetch_all_is_restartable_and_read_only() {
    let mut repo = SqliteTaskRepository::open_in_memory().unwrap();
    repo.add_project(&Project::new("P", "Home")).unwrap();

    let first = repo.fetch_history().unwrap();
    let second = repo.fetch_history().unwrap();
    assert_eq!(first, second);
}

#[test]
fn history_survives_entity_deletion() {
    let mut repo = SqliteTaskRepository::open_in_memory().unwrap();
    repo.add_project(&Project::new("P", "Home")).unwrap();
    repo.add_task("P", &task("T1")).unwrap();
    repo.delete_project("P").unwrap();

    let task_history = repo.fetch_history_for(EntityType::Task, "T1").unwrap();
    assert_eq!(task_history.len(), 1);
    assert_eq!(task_history[0].action, HistoryAction::Add);

    let project_history = repo.fetch_history_for(EntityType::Project, "P").unwrap();
    assert_eq!(
        project_history
            .iter()
            .map(|record| record.action)
            .collect::<Vec<_>>(),
        vec![HistoryAction::Delete, HistoryAction::Add]
    );
}

#[test]
fn record_appends_directly_through_a_connection() {
    let repo = SqliteTaskRepository::open_in_memory().unwrap();
    let conn = repo.connection();

    let id = history_repo::record(
        conn,
        EntityType::Task,
        "T9",
        HistoryAction::Edit,
        "manual entry",
    )
    .unwrap();

    let all = history_repo::fetch_all(conn).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, id);
    assert_eq!(all[0].details, "manual entry");
}

#[test]
fn failed_audit_write_rolls_back_the_primary_write() {
    let mut repo = SqliteTaskRepository::open_in_memory().unwrap();
    repo.add_project(&Project::new("P", "Home")).unwrap();
    repo.add_task("P", &task("T1")).unwrap();
    repo.connection()
        .execute_batch("DROP TABLE history;")
        .unwrap();

    let err = repo.add_project(&Project::new("Q", "Work")).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    assert_eq!(repo.list_projects().unwrap(), vec![Project::new("P", "Home")]);

    let err = repo.add_task("P", &task("T2")).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    assert!(repo.get_task("P", "T2").unwrap().is_none());

    let err = repo.delete_project("P").unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    assert_eq!(repo.list_projects().unwrap(), vec![Project::new("P", "Home")]);
    assert_eq!(repo.list_tasks("P").unwrap(), vec![task("T1")]);

    let err = repo.delete_task("P", "T1").unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    assert_eq!(repo.list_tasks("P").unwrap(), vec![task("T1")]);
}
