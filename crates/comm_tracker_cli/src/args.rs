use clap::{Parser, Subcommand};
use comm_tracker_core::{CommId, Flag};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "comm-tracker")]
#[command(about = "Track marketing communications and their review status", long_about = None)]
#[command(version)]
pub struct Cli {
    /// SQLite database file; created on first use.
    #[arg(long, default_value = "comm_tracker.db", global = true)]
    pub db: PathBuf,

    #[arg(long, value_parser = ["error", "warn", "info", "debug", "trace"], global = true)]
    pub log_level: Option<String>,

    /// Defaults to `logs/` next to the database file.
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a new communication dated today.
    Add {
        #[arg(long)]
        name: String,

        #[arg(long = "type")]
        comm_type: String,

        #[arg(long)]
        template: String,
    },

    List,

    /// Find communications by name or template id.
    Search { term: String },

    Show { id: CommId },

    /// Change the name or fill in who created/checked a communication.
    Edit {
        id: CommId,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        created_by: Option<String>,

        #[arg(long)]
        checked_by: Option<String>,
    },

    /// Record the review checklist for a communication.
    Review {
        id: CommId,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        created_by: Option<String>,

        #[arg(long)]
        checked_by: Option<String>,

        #[arg(long)]
        links_ok: Option<Flag>,

        #[arg(long)]
        format_ok: Option<Flag>,

        #[arg(long)]
        cta_ok: Option<Flag>,

        #[arg(long)]
        peer_reviewed: Option<Flag>,
    },

    Delete {
        #[arg(required = true)]
        ids: Vec<CommId>,
    },

    Import { file: PathBuf },

    Export {
        #[arg(default_value = "communications_export.csv")]
        file: PathBuf,
    },
}
