//! Core domain logic for the communication tracker.
//! This crate is the single source of truth for record invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod transfer;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::comm::{
    CommFieldsPatch, CommId, CommRecord, CommValidationError, Flag, NewComm, ParseFlagError,
    ReviewUpdate,
};
pub use repo::comm_repo::{CommRepository, RepoError, RepoResult, SqliteCommRepository};
pub use service::comm_service::CommService;
pub use transfer::{export_file, import_file, TransferError, TransferResult, EXPORT_HEADER};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
