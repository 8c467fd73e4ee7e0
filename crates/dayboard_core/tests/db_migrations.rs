use dayboard_core::db::migrations::{apply_migrations, latest_version, schema_version, MigrationReport};
use dayboard_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

fn tables(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name;")
        .unwrap();
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    names
}

#[test]
fn fresh_database_is_stamped_with_latest_schema() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    assert!(tables(&conn).contains(&"user_states".to_string()));
}

#[test]
fn migrating_a_blank_connection_reports_the_upgrade() {
    let mut conn = Connection::open_in_memory().unwrap();

    let first = apply_migrations(&mut conn).unwrap();
    assert_eq!(
        first,
        MigrationReport {
            from: 0,
            to: latest_version()
        }
    );
    assert!(first.upgraded());

    let second = apply_migrations(&mut conn).unwrap();
    assert!(!second.upgraded());
}

#[test]
fn reopening_a_file_keeps_rows_and_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dayboard.db");

    let conn = open_db(&path).unwrap();
    conn.execute(
        "INSERT INTO user_states (user_id, document) VALUES ('alice', '{}');",
        [],
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM user_states;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn file_from_a_newer_build_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");
    Connection::open(&path)
        .unwrap()
        .execute_batch("PRAGMA user_version = 999;")
        .unwrap();

    match open_db(&path) {
        Err(DbError::SchemaTooNew { found, supported }) => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("newer schema was accepted"),
    }
}

#[test]
fn user_id_is_a_unique_key() {
    let conn = open_db_in_memory().unwrap();
    let insert = "INSERT INTO user_states (user_id, document) VALUES ('alice', '{}');";

    conn.execute(insert, []).unwrap();
    assert!(conn.execute(insert, []).is_err());
}
