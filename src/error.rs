use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("`{command}` timed out after {}", pretty_duration(.after))]
    Timeout { command: String, after: Duration },
    #[error("Malformed history at line {line_no}: {line:?}")]
    MalformedHistory { line_no: usize, line: String },
    #[error("Invalid window: {0}")]
    InvalidWindow(String),
    #[error("Roster entry incomplete (row {row}): {reason}")]
    RosterEntryIncomplete { row: usize, reason: String },
    #[error("Git error: {0}")]
    Git(#[from] Box<gix::open::Error>),
    #[error("Git discover error: {0}")]
    GitDiscover(#[from] Box<gix::discover::Error>),
    #[error("Reference find error: {0}")]
    RefFind(#[from] Box<gix::reference::find::existing::Error>),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScanError {
    /// Errors that only invalidate the repository being processed; the batch
    /// logs them and moves on.
    pub fn is_repo_local(&self) -> bool {
        matches!(
            self,
            ScanError::SourceUnavailable(_)
                | ScanError::Timeout { .. }
                | ScanError::MalformedHistory { .. }
                | ScanError::InvalidWindow(_)
                | ScanError::RosterEntryIncomplete { .. }
                | ScanError::Git(_)
                | ScanError::GitDiscover(_)
                | ScanError::RefFind(_)
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::SourceUnavailable(_) => "source_unavailable",
            ScanError::Timeout { .. } => "timeout",
            ScanError::MalformedHistory { .. } => "malformed_history",
            ScanError::InvalidWindow(_) => "invalid_window",
            ScanError::RosterEntryIncomplete { .. } => "roster_entry_incomplete",
            ScanError::Git(_) | ScanError::GitDiscover(_) | ScanError::RefFind(_) => "git",
            ScanError::Database(_) | ScanError::Cache(_) => "cache",
            ScanError::Serde(_) | ScanError::Csv(_) => "serialization",
            ScanError::Io(_) => "io",
        }
    }
}

fn pretty_duration(d: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*d)
}

// Manual From implementations for unboxed to boxed conversions
impl From<gix::open::Error> for ScanError {
    fn from(err: gix::open::Error) -> Self {
        ScanError::Git(Box::new(err))
    }
}

impl From<gix::discover::Error> for ScanError {
    fn from(err: gix::discover::Error) -> Self {
        ScanError::GitDiscover(Box::new(err))
    }
}

impl From<gix::reference::find::existing::Error> for ScanError {
    fn from(err: gix::reference::find::existing::Error) -> Self {
        ScanError::RefFind(Box::new(err))
    }
}
