use comm_tracker_core::db::migrations::{apply_migrations, latest_version};
use comm_tracker_core::db::{open_db, open_db_in_memory, DbError};
use comm_tracker_core::{export_file, CommRepository, Flag, SqliteCommRepository};
use rusqlite::Connection;

const EXPECTED_COLUMNS: [&str; 11] = [
    "id",
    "date",
    "comm_name",
    "comm_type",
    "template_id",
    "created_by",
    "checked_by",
    "links_qr_correct",
    "format_correct",
    "cta_correct",
    "peer_reviewed",
];

#[test]
fn open_db_in_memory_creates_full_comms_table() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_eq!(column_names(&conn), EXPECTED_COLUMNS);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("comm_tracker.db");

    let mut conn_first = open_db(&path).unwrap();
    SqliteCommRepository::try_new(&mut conn_first)
        .unwrap()
        .insert("2024-01-01", "Spring Sale", "Email", "T-001")
        .unwrap();
    drop(conn_first);

    let mut conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    apply_migrations(&mut conn_second).unwrap();

    let repo = SqliteCommRepository::try_new(&mut conn_second).unwrap();
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn legacy_table_without_flags_gains_columns_and_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE comms (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            comm_name TEXT NOT NULL,
            comm_type TEXT NOT NULL,
            template_id TEXT NOT NULL,
            created_by TEXT DEFAULT '',
            checked_by TEXT DEFAULT ''
        );
        INSERT INTO comms (date, comm_name, comm_type, template_id, created_by)
        VALUES ('2023-11-05', 'Winter Promo', 'Letter', 'W-17', 'dana');",
    )
    .unwrap();
    drop(conn);

    let mut conn = open_db(&path).unwrap();
    assert_eq!(column_names(&conn), EXPECTED_COLUMNS);

    let repo = SqliteCommRepository::try_new(&mut conn).unwrap();
    let all = repo.get_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].comm_name, "Winter Promo");
    assert_eq!(all[0].created_by, "dana");
    assert_eq!(all[0].checked_by, "");
    assert_eq!(all[0].links_qr_correct, Flag::No);
    assert_eq!(all[0].format_correct, Flag::No);
    assert_eq!(all[0].cta_correct, Flag::No);
    assert_eq!(all[0].peer_reviewed, Flag::No);
}

#[test]
fn unversioned_table_with_all_columns_upgrades_without_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unversioned.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE comms (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            comm_name TEXT NOT NULL,
            comm_type TEXT NOT NULL,
            template_id TEXT NOT NULL,
            created_by TEXT DEFAULT '',
            checked_by TEXT DEFAULT '',
            links_qr_correct TEXT DEFAULT 'No',
            format_correct TEXT DEFAULT 'No',
            cta_correct TEXT DEFAULT 'No',
            peer_reviewed TEXT DEFAULT 'No'
        );
        INSERT INTO comms (date, comm_name, comm_type, template_id, peer_reviewed)
        VALUES ('2024-05-01', 'May Mailer', 'Email', 'M-1', 'Yes');",
    )
    .unwrap();
    drop(conn);

    let mut conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    assert_eq!(column_names(&conn), EXPECTED_COLUMNS);

    let repo = SqliteCommRepository::try_new(&mut conn).unwrap();
    let record = repo.get_by_id(1).unwrap();
    assert_eq!(record.peer_reviewed, Flag::Yes);
    assert_eq!(record.cta_correct, Flag::No);
}

#[test]
fn unversioned_rows_with_blank_or_lowercase_flags_stay_readable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("imported-by-hand.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE comms (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            comm_name TEXT NOT NULL,
            comm_type TEXT NOT NULL,
            template_id TEXT NOT NULL,
            created_by TEXT DEFAULT '',
            checked_by TEXT DEFAULT '',
            links_qr_correct TEXT DEFAULT 'No',
            format_correct TEXT DEFAULT 'No',
            cta_correct TEXT DEFAULT 'No',
            peer_reviewed TEXT DEFAULT 'No'
        );
        INSERT INTO comms (date, comm_name, comm_type, template_id, links_qr_correct)
        VALUES ('2024-05-01', 'May Mailer', 'Email', 'M-1', 'No');
        INSERT INTO comms (
            date, comm_name, comm_type, template_id,
            links_qr_correct, format_correct, cta_correct, peer_reviewed
        )
        VALUES ('2024-05-02', 'June Flyer', 'Print', 'J-2', '', 'yes', 'NO', ' ');",
    )
    .unwrap();
    drop(conn);

    let mut conn = open_db(&path).unwrap();
    let repo = SqliteCommRepository::try_new(&mut conn).unwrap();

    let all = repo.get_all().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].links_qr_correct, Flag::No);
    assert_eq!(all[1].format_correct, Flag::Yes);
    assert_eq!(all[1].cta_correct, Flag::No);
    assert_eq!(all[1].peer_reviewed, Flag::No);

    let export_path = dir.path().join("export.csv");
    assert_eq!(export_file(&repo, &export_path).unwrap(), 2);
    let text = std::fs::read_to_string(&export_path).unwrap();
    assert!(text.contains("2,2024-05-02,June Flyer,Print,J-2,,,No,Yes,No,No"));
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn column_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn.prepare("PRAGMA table_info(comms);").unwrap();
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    names
}
