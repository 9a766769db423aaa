//! Communication record model.
//!
//! # Responsibility
//! - Define `CommRecord` and the write-side shapes used to create or edit it.
//! - Validate required text fields before persistence.
//!
//! # Invariants
//! - `comm_name`, `comm_type` and `template_id` are never blank once stored.
//! - `id` is assigned by the store and never changes.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Store-assigned row identifier.
pub type CommId = i64;

/// Yes/No correctness indicator stored as text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flag {
    Yes,
    #[default]
    No,
}

impl Flag {
    /// Text form persisted in SQLite and written to CSV.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }

    pub fn is_yes(self) -> bool {
        self == Self::Yes
    }
}

impl From<bool> for Flag {
    fn from(value: bool) -> Self {
        if value {
            Self::Yes
        } else {
            Self::No
        }
    }
}

impl Display for Flag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when text is neither `Yes` nor `No`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFlagError(pub String);

impl Display for ParseFlagError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid flag value `{}`; expected Yes or No", self.0)
    }
}

impl Error for ParseFlagError {}

impl FromStr for Flag {
    type Err = ParseFlagError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("yes") {
            Ok(Self::Yes)
        } else if trimmed.eq_ignore_ascii_case("no") {
            Ok(Self::No)
        } else {
            Err(ParseFlagError(value.to_string()))
        }
    }
}

/// Validation failures for communication write paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommValidationError {
    /// A required text field is empty or whitespace only.
    EmptyField(&'static str),
}

impl Display for CommValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "{field} is required"),
        }
    }
}

impl Error for CommValidationError {}

/// One stored communication item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommRecord {
    pub id: CommId,
    /// ISO 8601 calendar date (`YYYY-MM-DD`).
    pub date: String,
    pub comm_name: String,
    pub comm_type: String,
    pub template_id: String,
    pub created_by: String,
    pub checked_by: String,
    pub links_qr_correct: Flag,
    pub format_correct: Flag,
    pub cta_correct: Flag,
    pub peer_reviewed: Flag,
}

impl CommRecord {
    /// Returns the write-side shape of this record, dropping the id.
    pub fn to_new(&self) -> NewComm {
        NewComm {
            date: self.date.clone(),
            comm_name: self.comm_name.clone(),
            comm_type: self.comm_type.clone(),
            template_id: self.template_id.clone(),
            created_by: self.created_by.clone(),
            checked_by: self.checked_by.clone(),
            links_qr_correct: self.links_qr_correct,
            format_correct: self.format_correct,
            cta_correct: self.cta_correct,
            peer_reviewed: self.peer_reviewed,
        }
    }
}

/// All non-id fields of a record, used for inserts and bulk import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComm {
    pub date: String,
    pub comm_name: String,
    pub comm_type: String,
    pub template_id: String,
    pub created_by: String,
    pub checked_by: String,
    pub links_qr_correct: Flag,
    pub format_correct: Flag,
    pub cta_correct: Flag,
    pub peer_reviewed: Flag,
}

impl NewComm {
    /// Creates an insert payload with empty reviewers and all flags `No`.
    pub fn new(
        date: impl Into<String>,
        comm_name: impl Into<String>,
        comm_type: impl Into<String>,
        template_id: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            comm_name: comm_name.into(),
            comm_type: comm_type.into(),
            template_id: template_id.into(),
            created_by: String::new(),
            checked_by: String::new(),
            links_qr_correct: Flag::No,
            format_correct: Flag::No,
            cta_correct: Flag::No,
            peer_reviewed: Flag::No,
        }
    }

    /// Checks the required text fields.
    pub fn validate(&self) -> Result<(), CommValidationError> {
        require("comm_name", &self.comm_name)?;
        require("comm_type", &self.comm_type)?;
        require("template_id", &self.template_id)?;
        Ok(())
    }
}

/// Partial edit of the free-text fields.
///
/// `None` leaves a column untouched; `Some(String::new())` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommFieldsPatch {
    pub comm_name: Option<String>,
    pub created_by: Option<String>,
    pub checked_by: Option<String>,
}

impl CommFieldsPatch {
    pub fn is_empty(&self) -> bool {
        self.comm_name.is_none() && self.created_by.is_none() && self.checked_by.is_none()
    }

    pub fn validate(&self) -> Result<(), CommValidationError> {
        if let Some(comm_name) = &self.comm_name {
            require("comm_name", comm_name)?;
        }
        Ok(())
    }
}

/// Full replacement of every field a reviewer may change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewUpdate {
    pub comm_name: String,
    pub created_by: String,
    pub checked_by: String,
    pub links_qr_correct: Flag,
    pub format_correct: Flag,
    pub cta_correct: Flag,
    pub peer_reviewed: Flag,
}

impl ReviewUpdate {
    /// Seeds a review from the current state of a record.
    pub fn from_record(record: &CommRecord) -> Self {
        Self {
            comm_name: record.comm_name.clone(),
            created_by: record.created_by.clone(),
            checked_by: record.checked_by.clone(),
            links_qr_correct: record.links_qr_correct,
            format_correct: record.format_correct,
            cta_correct: record.cta_correct,
            peer_reviewed: record.peer_reviewed,
        }
    }

    pub fn validate(&self) -> Result<(), CommValidationError> {
        require("comm_name", &self.comm_name)
    }
}

/// Today's local date in the `YYYY-MM-DD` form stored in `comms.date`.
pub fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

fn require(field: &'static str, value: &str) -> Result<(), CommValidationError> {
    if value.trim().is_empty() {
        return Err(CommValidationError::EmptyField(field));
    }
    Ok(())
}
