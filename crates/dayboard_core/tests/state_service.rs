use chrono::{DateTime, TimeZone, Utc};
use dayboard_core::db::migrations::latest_version;
use dayboard_core::db::open_db_in_memory;
use dayboard_core::templates::{default_body_tasks, default_skin_tasks};
use dayboard_core::{
    DayKey, RepoError, SqliteStateRepository, StateRepository, StateService, UserState,
    UserStatePatch,
};
use rusqlite::Connection;
use serde_json::json;

fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

#[test]
fn fresh_user_is_seeded_with_defaults_on_first_fetch() {
    let conn = open_db_in_memory().unwrap();
    let service = StateService::new(SqliteStateRepository::try_new(&conn).unwrap());
    let now = at(2024, 7, 15, 9);

    let state = service.fetch_at("alice", now).unwrap();

    assert_eq!(state.user_id, "alice");
    assert_eq!(state.body_tasks.len(), 10);
    assert_eq!(state.body_tasks, default_body_tasks());
    assert!(state.body_tasks.iter().all(|task| !task.completed));
    assert_eq!(state.skin_sessions, 0);
    assert_eq!(state.day_key, DayKey::from_instant(now).as_str());
}

#[test]
fn stale_record_is_reset_and_persisted_on_next_day_fetch() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStateRepository::try_new(&conn).unwrap();

    let mut stored = UserState::seeded("alice", &DayKey::parse("2024-01-01").unwrap());
    stored.body_tasks[0].completed = true;
    repo.save_state(&stored).unwrap();

    let service = StateService::new(repo);
    let state = service.fetch_at("alice", at(2024, 1, 2, 6)).unwrap();

    assert!(!state.body_tasks[0].completed);
    assert_eq!(state.day_key, "2024-01-02");

    let repo = SqliteStateRepository::try_new(&conn).unwrap();
    let persisted = repo.get_state("alice").unwrap().unwrap();
    assert_eq!(persisted, state);
    let column_day_key: String = conn
        .query_row(
            "SELECT day_key FROM user_states WHERE user_id = 'alice';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(column_day_key, "2024-01-02");
}

#[test]
fn same_day_fetch_keeps_completed_flags() {
    let conn = open_db_in_memory().unwrap();
    let service = StateService::new(SqliteStateRepository::try_new(&conn).unwrap());
    let morning = at(2024, 3, 4, 2);
    let evening = at(2024, 3, 4, 14);

    let mut patch = UserStatePatch::default();
    let mut tasks = default_body_tasks();
    tasks[3].completed = true;
    patch.body_tasks = Some(tasks);
    service.update_at("alice", patch, morning).unwrap();

    let state = service.fetch_at("alice", evening).unwrap();
    assert!(state.body_tasks[3].completed);
}

#[test]
fn update_overlays_only_provided_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = StateService::new(SqliteStateRepository::try_new(&conn).unwrap());
    let now = at(2024, 8, 1, 10);

    let patch: UserStatePatch = serde_json::from_value(json!({ "skinSessions": 5 })).unwrap();
    let state = service.update_at("alice", patch, now).unwrap();

    assert_eq!(state.skin_sessions, 5);
    assert_eq!(state.body_tasks, default_body_tasks());
    assert_eq!(state.skin_tasks, default_skin_tasks());
    assert_eq!(state.mind_subjects.len(), 3);

    let fetched = service.fetch_at("alice", now).unwrap();
    assert_eq!(fetched, state);
}

#[test]
fn update_on_a_new_day_resets_before_overlaying() {
    let conn = open_db_in_memory().unwrap();
    let service = StateService::new(SqliteStateRepository::try_new(&conn).unwrap());

    let mut tasks = default_skin_tasks();
    tasks[0].completed = true;
    let patch = UserStatePatch {
        skin_tasks: Some(tasks),
        skin_sessions: Some(3),
        ..UserStatePatch::default()
    };
    service.update_at("alice", patch, at(2024, 1, 1, 5)).unwrap();

    let patch = UserStatePatch {
        planner_tasks: Some(json!([{ "title": "groceries" }])),
        ..UserStatePatch::default()
    };
    let state = service.update_at("alice", patch, at(2024, 1, 2, 5)).unwrap();

    assert!(state.skin_tasks.iter().all(|task| !task.completed));
    assert_eq!(state.skin_sessions, 3);
    assert_eq!(state.planner_tasks, json!([{ "title": "groceries" }]));
    assert_eq!(state.day_key, "2024-01-02");
}

#[test]
fn caller_supplied_completion_on_same_day_wins() {
    let conn = open_db_in_memory().unwrap();
    let service = StateService::new(SqliteStateRepository::try_new(&conn).unwrap());
    let now = at(2024, 1, 2, 5);
    service.fetch_at("alice", now).unwrap();

    let mut tasks = default_body_tasks();
    tasks[0].completed = true;
    let patch = UserStatePatch {
        body_tasks: Some(tasks),
        ..UserStatePatch::default()
    };
    let state = service.update_at("alice", patch, now).unwrap();

    assert!(state.body_tasks[0].completed);
}

#[test]
fn blank_user_id_uses_demo_record() {
    let conn = open_db_in_memory().unwrap();
    let service = StateService::new(SqliteStateRepository::try_new(&conn).unwrap());

    let state = service.fetch_at("  ", at(2024, 1, 1, 0)).unwrap();
    assert_eq!(state.user_id, "demo");

    let repo = SqliteStateRepository::try_new(&conn).unwrap();
    assert!(repo.get_state("demo").unwrap().is_some());
}

#[test]
fn get_or_create_never_duplicates_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteStateRepository::try_new(&conn).unwrap();
    let today = DayKey::parse("2024-02-02").unwrap();

    let first = repo.get_or_create("alice", &today).unwrap();
    let second = repo.get_or_create("alice", &today).unwrap();
    assert_eq!(first, second);

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM user_states;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn users_do_not_share_state() {
    let conn = open_db_in_memory().unwrap();
    let service = StateService::new(SqliteStateRepository::try_new(&conn).unwrap());
    let now = at(2024, 4, 4, 4);

    let patch = UserStatePatch {
        skin_sessions: Some(9),
        ..UserStatePatch::default()
    };
    service.update_at("alice", patch, now).unwrap();

    let bob = service.fetch_at("bob", now).unwrap();
    assert_eq!(bob.skin_sessions, 0);
}

#[test]
fn sparse_legacy_document_is_completed_on_fetch() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO user_states (user_id, document, day_key)
         VALUES ('legacy', '{\"skinSessions\": 12, \"weightInput\": \"71.5\"}', '');",
        [],
    )
    .unwrap();
    let service = StateService::new(SqliteStateRepository::try_new(&conn).unwrap());

    let state = service.fetch_at("legacy", at(2024, 5, 5, 5)).unwrap();

    assert_eq!(state.user_id, "legacy");
    assert_eq!(state.skin_sessions, 12);
    assert_eq!(state.weight_input, json!("71.5"));
    assert_eq!(state.body_tasks.len(), 10);
    assert_eq!(state.day_key, "2024-05-05");
}

#[test]
fn corrupt_document_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO user_states (user_id, document) VALUES ('broken', 'not json');",
        [],
    )
    .unwrap();
    let service = StateService::new(SqliteStateRepository::try_new(&conn).unwrap());

    let err = service.fetch_at("broken", at(2024, 5, 5, 5)).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteStateRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_user_states_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteStateRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("user_states"))
    ));
}
