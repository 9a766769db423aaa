//! Bulk transfer of communication records to and from flat files.
//!
//! # Responsibility
//! - Import CSV files into the repository as new records.
//! - Export every stored record to CSV in storage order.
//!
//! # Invariants
//! - An import either writes every accepted row or nothing.
//! - Failures carry the path of the file being transferred.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod csv_file;

pub use csv_file::{export_file, import_file, EXPORT_HEADER};

pub type TransferResult<T> = Result<T, TransferError>;

pub type Cause = Box<dyn Error + Send + Sync + 'static>;

/// Failure of a whole import or export run.
#[derive(Debug)]
pub enum TransferError {
    Import {
        path: PathBuf,
        cause: Cause,
    },
    Export {
        path: PathBuf,
        cause: Cause,
    },
}

impl TransferError {
    pub(crate) fn import(path: impl Into<PathBuf>, cause: impl Into<Cause>) -> Self {
        Self::Import {
            path: path.into(),
            cause: cause.into(),
        }
    }

    pub(crate) fn export(path: impl Into<PathBuf>, cause: impl Into<Cause>) -> Self {
        Self::Export {
            path: path.into(),
            cause: cause.into(),
        }
    }
}

impl Display for TransferError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Import { path, cause } => {
                write!(f, "CSV import from `{}` failed: {cause}", path.display())
            }
            Self::Export { path, cause } => {
                write!(f, "CSV export to `{}` failed: {cause}", path.display())
            }
        }
    }
}

impl Error for TransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Import { cause, .. } | Self::Export { cause, .. } => Some(cause.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TransferError;
    use std::error::Error;
    use std::io::ErrorKind;

    fn assert_thread_safe<T: Send + Sync + 'static>() {}

    #[test]
    fn transfer_error_can_cross_threads() {
        assert_thread_safe::<TransferError>();

        let err = TransferError::import(
            "comms.csv",
            std::io::Error::new(ErrorKind::NotFound, "gone"),
        );
        let err = std::thread::spawn(move || err).join().unwrap();
        let boxed: Box<dyn Error + Send + Sync> = Box::new(err);
        assert!(boxed.to_string().contains("comms.csv"));
        assert_eq!(boxed.source().unwrap().to_string(), "gone");
    }

    #[test]
    fn export_error_names_the_path() {
        let err = TransferError::export("out/comms.csv", "disk full");
        assert_eq!(
            err.to_string(),
            "CSV export to `out/comms.csv` failed: disk full"
        );
    }
}
