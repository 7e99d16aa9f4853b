use rusqlite::Connection;
use taskorg_core::db::migrations::{apply_migrations, latest_version, schema_version};
use taskorg_core::db::{open_db, open_db_in_memory, DbError};
use taskorg_core::{Project, RepoError, SqliteTaskRepository, TaskRepository};

#[test]
fn open_db_in_memory_provisions_all_relations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    assert_table_exists(&conn, "projects");
    assert_table_exists(&conn, "tasks");
    assert_table_exists(&conn, "history");
}

#[test]
fn tasks_and_history_carry_expected_columns() {
    let conn = open_db_in_memory().unwrap();

    for column in [
        "project_id",
        "id",
        "description",
        "due_date",
        "status",
        "priority",
        "recurrence",
    ] {
        assert!(table_has_column(&conn, "tasks", column), "tasks.{column}");
    }
    for column in [
        "id",
        "entity_type",
        "entity_id",
        "action",
        "details",
        "created_at",
    ] {
        assert!(
            table_has_column(&conn, "history", column),
            "history.{column}"
        );
    }
}

#[test]
fn reopening_a_store_keeps_schema_and_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("organizer.db");

    {
        let mut repo = SqliteTaskRepository::open(&path).unwrap();
        repo.add_project(&Project::new("P", "Home")).unwrap();
    }

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    let repo = SqliteTaskRepository::try_new(conn).unwrap();
    assert_eq!(repo.list_projects().unwrap(), vec![Project::new("P", "Home")]);
    assert_eq!(repo.fetch_history().unwrap().len(), 1);
}

#[test]
fn migrating_a_current_store_is_a_no_op() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO projects (id, name) VALUES ('P', 'Home');",
        [],
    )
    .unwrap();

    apply_migrations(&mut conn).unwrap();

    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    let projects: i64 = conn
        .query_row("SELECT COUNT(*) FROM projects;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(projects, 1);
}

#[test]
fn store_from_newer_build_is_refused_and_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("newer.db");
    Connection::open(&path)
        .unwrap()
        .pragma_update(None, "user_version", 999_u32)
        .unwrap();

    let err = open_db(&path).unwrap_err();
    assert!(matches!(
        err,
        DbError::UnsupportedSchemaVersion {
            db_version: 999,
            latest_supported,
        } if latest_supported == latest_version()
    ));

    let untouched = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&untouched).unwrap(), 999);
    let tables: i64 = untouched
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(tables, 0);
}

#[test]
fn repository_rejects_unprovisioned_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteTaskRepository::try_new(conn)
        .err()
        .expect("raw connection must be rejected");
    assert!(matches!(
        err,
        RepoError::UninitializedStore {
            actual_version: 0,
            ..
        }
    ));
}

#[test]
fn into_inner_returns_the_owned_connection() {
    let repo = SqliteTaskRepository::open_in_memory().unwrap();
    let conn = repo.into_inner();
    assert_eq!(schema_version(&conn).unwrap(), latest_version());
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> bool {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table});"))
        .unwrap();
    let mut rows = stmt.query([]).unwrap();
    while let Some(row) = rows.next().unwrap() {
        let name: String = row.get(1).unwrap();
        if name == column {
            return true;
        }
    }
    false
}
