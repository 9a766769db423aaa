//! Command-line front end for the communication tracker.
//!
//! # Responsibility
//! - Parse commands, open the database and start file logging.
//! - Render records as plain-text tables.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};

mod args;
mod commands;

fn main() {
    let cli = args::Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: args::Cli) -> anyhow::Result<()> {
    let log_dir = resolve_log_dir(&cli.db, cli.log_dir.as_deref())?;
    let level = cli
        .log_level
        .as_deref()
        .unwrap_or(comm_tracker_core::default_log_level());
    if let Err(err) = comm_tracker_core::init_logging(level, &log_dir) {
        eprintln!("warning: file logging disabled: {err}");
    }

    let mut conn = comm_tracker_core::db::open_db(&cli.db)
        .with_context(|| format!("failed to open database `{}`", cli.db.display()))?;
    commands::dispatch(&mut conn, cli.command)
}

fn resolve_log_dir(db: &Path, log_dir: Option<&Path>) -> anyhow::Result<PathBuf> {
    let dir = match log_dir {
        Some(dir) => dir.to_path_buf(),
        None => db
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
            .join("logs"),
    };
    if dir.is_absolute() {
        return Ok(dir);
    }
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    Ok(cwd.join(dir))
}

#[cfg(test)]
mod tests {
    use super::resolve_log_dir;
    use std::path::Path;

    #[test]
    fn log_dir_defaults_next_to_database_and_is_absolute() {
        let dir = resolve_log_dir(Path::new("data/comm_tracker.db"), None).unwrap();
        assert!(dir.is_absolute());
        assert!(dir.ends_with("data/logs"));

        let bare = resolve_log_dir(Path::new("comm_tracker.db"), None).unwrap();
        assert!(bare.ends_with("logs"));
    }

    #[test]
    fn explicit_absolute_log_dir_is_kept() {
        let explicit = std::env::temp_dir().join("comm-tracker-logs");
        let dir = resolve_log_dir(Path::new("comm_tracker.db"), Some(&explicit)).unwrap();
        assert_eq!(dir, explicit);
    }
}
