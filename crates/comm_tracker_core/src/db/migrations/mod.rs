//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema steps for the `comms` table in strictly increasing order.
//! - Apply pending steps atomically.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - Every step is safe to re-run against a database written before version
//!   tracking existed (`user_version = 0` with some or all columns present).

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, Transaction};

#[derive(Debug, Clone, Copy)]
enum MigrationStep {
    /// Raw SQL batch; must be written with `IF NOT EXISTS` guards.
    Sql(&'static str),
    /// Adds each `(name, definition)` column that the table does not have yet.
    AddColumns {
        table: &'static str,
        columns: &'static [(&'static str, &'static str)],
    },
}

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    step: MigrationStep,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        step: MigrationStep::Sql(include_str!("0001_comms.sql")),
    },
    Migration {
        version: 2,
        step: MigrationStep::AddColumns {
            table: "comms",
            columns: &[
                ("links_qr_correct", "TEXT DEFAULT 'No'"),
                ("format_correct", "TEXT DEFAULT 'No'"),
                ("cta_correct", "TEXT DEFAULT 'No'"),
                ("peer_reviewed", "TEXT DEFAULT 'No'"),
            ],
        },
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
///
/// Safe to call on every startup: a database already at [`latest_version`]
/// is left untouched.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        apply_step(&tx, migration.step)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        current_version, latest
    );
    Ok(())
}

fn apply_step(tx: &Transaction<'_>, step: MigrationStep) -> DbResult<()> {
    match step {
        MigrationStep::Sql(sql) => tx.execute_batch(sql)?,
        MigrationStep::AddColumns { table, columns } => {
            let existing = table_columns(tx, table)?;
            for (name, definition) in columns {
                if existing.iter().any(|column| column == name) {
                    continue;
                }
                tx.execute_batch(&format!(
                    "ALTER TABLE {table} ADD COLUMN {name} {definition};"
                ))?;
            }
        }
    }
    Ok(())
}

fn table_columns(conn: &Connection, table: &str) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    Ok(columns)
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
