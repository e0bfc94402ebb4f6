//! Custom error types for the backup/restore engine
//!
//! Provides structured error handling so failures can be classified without
//! string-matching driver messages: a restore decides whether to defer,
//! permanently fail, or abort based on the variant alone.

use std::fmt;

/// Fatal restore-level errors. Anything not covered here is scoped to a
/// single record and reported through the error log instead.
#[derive(Debug)]
pub enum RestoreError {
    /// Snapshot failed shape validation; no writes were attempted
    Structural { reason: String },

    /// The whole-restore time budget was exhausted
    Timeout { elapsed_secs: u64, budget_secs: u64 },
}

/// Per-record upsert failures reported by a datastore adapter.
#[derive(Debug, Clone)]
pub enum UpsertError {
    /// A referenced entity does not yet exist in the target datastore.
    /// Recoverable: the record gets exactly one more attempt after the
    /// rest of the snapshot has been applied.
    MissingReference {
        field: String,
        target_table: String,
        target_key: String,
    },

    /// The record itself is unusable (missing key fields, nested payload)
    Malformed { reason: String },

    /// The underlying store rejected the write for a non-dependency reason
    Storage { reason: String },
}

impl UpsertError {
    /// Whether this failure is worth one deferred retry
    pub fn is_dependency_violation(&self) -> bool {
        matches!(self, UpsertError::MissingReference { .. })
    }
}

impl fmt::Display for RestoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestoreError::Structural { reason } => {
                write!(f, "Snapshot failed structural validation: {}", reason)
            }
            RestoreError::Timeout {
                elapsed_secs,
                budget_secs,
            } => {
                write!(
                    f,
                    "Restore exceeded its time budget ({}s elapsed, {}s allowed)",
                    elapsed_secs, budget_secs
                )
            }
        }
    }
}

impl fmt::Display for UpsertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpsertError::MissingReference {
                field,
                target_table,
                target_key,
            } => {
                write!(
                    f,
                    "Reference '{}' points at missing {} record '{}'",
                    field, target_table, target_key
                )
            }
            UpsertError::Malformed { reason } => write!(f, "Malformed record: {}", reason),
            UpsertError::Storage { reason } => write!(f, "Storage error: {}", reason),
        }
    }
}

impl std::error::Error for RestoreError {}
impl std::error::Error for UpsertError {}

impl From<anyhow::Error> for UpsertError {
    fn from(err: anyhow::Error) -> Self {
        UpsertError::Storage {
            reason: err.to_string(),
        }
    }
}
