//! Communication repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/read/update/delete/search over the `comms` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths validate before SQL mutations.
//! - Read paths reject invalid persisted flag text instead of masking it.
//! - Every mutating call commits before returning.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::comm::{
    CommFieldsPatch, CommId, CommRecord, CommValidationError, Flag, NewComm, ReviewUpdate,
};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const COMM_SELECT_SQL: &str = "SELECT
    id,
    date,
    comm_name,
    comm_type,
    template_id,
    created_by,
    checked_by,
    links_qr_correct,
    format_correct,
    cta_correct,
    peer_reviewed
FROM comms";

const INSERT_COMM_SQL: &str = "INSERT INTO comms (
    date,
    comm_name,
    comm_type,
    template_id,
    created_by,
    checked_by,
    links_qr_correct,
    format_correct,
    cta_correct,
    peer_reviewed
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);";

const REQUIRED_COLUMNS: [&str; 11] = [
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

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for comm persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(CommValidationError),
    Db(DbError),
    NotFound(CommId),
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "communication not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted comm data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "comm repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "comm repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "comm repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<CommValidationError> for RepoError {
    fn from(value: CommValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for communication records.
pub trait CommRepository {
    /// Inserts a record with default reviewers and flags; returns its new id.
    fn insert(
        &self,
        date: &str,
        comm_name: &str,
        comm_type: &str,
        template_id: &str,
    ) -> RepoResult<CommId>;
    /// Inserts a record with every non-id field supplied by the caller.
    fn insert_full(&self, comm: &NewComm) -> RepoResult<CommId>;
    /// Inserts many records in one transaction; nothing is written on error.
    fn insert_batch(&mut self, comms: &[NewComm]) -> RepoResult<Vec<CommId>>;
    /// Returns every record in insertion order.
    fn get_all(&self) -> RepoResult<Vec<CommRecord>>;
    /// Substring match on `comm_name` or `template_id`; an empty term lists all.
    fn search(&self, term: &str) -> RepoResult<Vec<CommRecord>>;
    fn get_by_id(&self, id: CommId) -> RepoResult<CommRecord>;
    /// Writes only the fields present in `patch`.
    fn update_fields(&self, id: CommId, patch: &CommFieldsPatch) -> RepoResult<()>;
    fn update_review(&self, id: CommId, review: &ReviewUpdate) -> RepoResult<()>;
    /// Deletes all listed ids in one transaction and returns rows removed.
    fn delete(&mut self, ids: &[CommId]) -> RepoResult<usize>;
    fn count(&self) -> RepoResult<usize>;
}

/// SQLite-backed comm repository.
pub struct SqliteCommRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteCommRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_comm_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CommRepository for SqliteCommRepository<'_> {
    fn insert(
        &self,
        date: &str,
        comm_name: &str,
        comm_type: &str,
        template_id: &str,
    ) -> RepoResult<CommId> {
        self.insert_full(&NewComm::new(date, comm_name, comm_type, template_id))
    }

    fn insert_full(&self, comm: &NewComm) -> RepoResult<CommId> {
        comm.validate()?;
        insert_row(self.conn, comm)
    }

    fn insert_batch(&mut self, comms: &[NewComm]) -> RepoResult<Vec<CommId>> {
        for comm in comms {
            comm.validate()?;
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut ids = Vec::with_capacity(comms.len());
        for comm in comms {
            ids.push(insert_row(&tx, comm)?);
        }
        tx.commit()?;

        Ok(ids)
    }

    fn get_all(&self) -> RepoResult<Vec<CommRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COMM_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        collect_rows(&mut rows)
    }

    fn search(&self, term: &str) -> RepoResult<Vec<CommRecord>> {
        if term.is_empty() {
            return self.get_all();
        }

        let pattern = format!("%{}%", escape_like(term));
        let mut stmt = self.conn.prepare(&format!(
            "{COMM_SELECT_SQL}
             WHERE comm_name LIKE ?1 ESCAPE '\\'
                OR template_id LIKE ?1 ESCAPE '\\'
             ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([pattern])?;
        collect_rows(&mut rows)
    }

    fn get_by_id(&self, id: CommId) -> RepoResult<CommRecord> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COMM_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return parse_comm_row(row);
        }

        Err(RepoError::NotFound(id))
    }

    fn update_fields(&self, id: CommId, patch: &CommFieldsPatch) -> RepoResult<()> {
        patch.validate()?;

        let mut assignments = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();
        for (column, value) in [
            ("comm_name", &patch.comm_name),
            ("created_by", &patch.created_by),
            ("checked_by", &patch.checked_by),
        ] {
            if let Some(value) = value {
                assignments.push(format!("{column} = ?"));
                bind_values.push(Value::Text(value.clone()));
            }
        }

        if assignments.is_empty() {
            if !comm_exists(self.conn, id)? {
                return Err(RepoError::NotFound(id));
            }
            return Ok(());
        }

        bind_values.push(Value::Integer(id));
        let sql = format!("UPDATE comms SET {} WHERE id = ?;", assignments.join(", "));
        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        debug!(
            "event=comm_update module=repo status=ok id={id} columns={}",
            assignments.len()
        );
        Ok(())
    }

    fn update_review(&self, id: CommId, review: &ReviewUpdate) -> RepoResult<()> {
        review.validate()?;

        let changed = self.conn.execute(
            "UPDATE comms
             SET
                comm_name = ?1,
                created_by = ?2,
                checked_by = ?3,
                links_qr_correct = ?4,
                format_correct = ?5,
                cta_correct = ?6,
                peer_reviewed = ?7
             WHERE id = ?8;",
            params![
                review.comm_name.as_str(),
                review.created_by.as_str(),
                review.checked_by.as_str(),
                review.links_qr_correct.as_str(),
                review.format_correct.as_str(),
                review.cta_correct.as_str(),
                review.peer_reviewed.as_str(),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete(&mut self, ids: &[CommId]) -> RepoResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut removed = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM comms WHERE id = ?1;")?;
            for id in ids {
                removed += stmt.execute([id])?;
            }
        }
        tx.commit()?;

        debug!(
            "event=comm_delete module=repo status=ok requested={} removed={removed}",
            ids.len()
        );
        Ok(removed)
    }

    fn count(&self) -> RepoResult<usize> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM comms;", [], |row| row.get::<_, i64>(0))?;
        usize::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("invalid row count `{count}`")))
    }
}

fn insert_row(conn: &Connection, comm: &NewComm) -> RepoResult<CommId> {
    conn.execute(
        INSERT_COMM_SQL,
        params![
            comm.date.as_str(),
            comm.comm_name.as_str(),
            comm.comm_type.as_str(),
            comm.template_id.as_str(),
            comm.created_by.as_str(),
            comm.checked_by.as_str(),
            comm.links_qr_correct.as_str(),
            comm.format_correct.as_str(),
            comm.cta_correct.as_str(),
            comm.peer_reviewed.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn comm_exists(conn: &Connection, id: CommId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM comms WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn collect_rows(rows: &mut rusqlite::Rows<'_>) -> RepoResult<Vec<CommRecord>> {
    let mut comms = Vec::new();
    while let Some(row) = rows.next()? {
        comms.push(parse_comm_row(row)?);
    }
    Ok(comms)
}

fn parse_comm_row(row: &Row<'_>) -> RepoResult<CommRecord> {
    Ok(CommRecord {
        id: row.get("id")?,
        date: row.get("date")?,
        comm_name: row.get("comm_name")?,
        comm_type: row.get("comm_type")?,
        template_id: row.get("template_id")?,
        created_by: row.get::<_, Option<String>>("created_by")?.unwrap_or_default(),
        checked_by: row.get::<_, Option<String>>("checked_by")?.unwrap_or_default(),
        links_qr_correct: parse_flag_column(row, "links_qr_correct")?,
        format_correct: parse_flag_column(row, "format_correct")?,
        cta_correct: parse_flag_column(row, "cta_correct")?,
        peer_reviewed: parse_flag_column(row, "peer_reviewed")?,
    })
}

// Older databases hold flag text as typed by the operator (`''`, `yes`).
fn parse_flag_column(row: &Row<'_>, column: &'static str) -> RepoResult<Flag> {
    match row.get::<_, Option<String>>(column)? {
        None => Ok(Flag::No),
        Some(text) if text.trim().is_empty() => Ok(Flag::No),
        Some(text) => text.parse::<Flag>().map_err(|_| {
            RepoError::InvalidData(format!("invalid flag `{text}` in comms.{column}"))
        }),
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn ensure_comm_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "comms")? {
        return Err(RepoError::MissingRequiredTable("comms"));
    }

    for column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "comms", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "comms",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
