use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ImportJobId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImportKind {
    Expense,
    Income,
}

impl std::fmt::Display for ImportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportKind::Expense => write!(f, "expense"),
            ImportKind::Income => write!(f, "income"),
        }
    }
}

impl std::str::FromStr for ImportKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expense" => Ok(ImportKind::Expense),
            "income" => Ok(ImportKind::Income),
            other => Err(format!("Unknown import kind: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImportJobStatus {
    Pending,
    Completed,
    Failed,
    RolledBack,
}

impl std::fmt::Display for ImportJobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportJobStatus::Pending => write!(f, "pending"),
            ImportJobStatus::Completed => write!(f, "completed"),
            ImportJobStatus::Failed => write!(f, "failed"),
            ImportJobStatus::RolledBack => write!(f, "rolled_back"),
        }
    }
}

impl std::str::FromStr for ImportJobStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ImportJobStatus::Pending),
            "completed" => Ok(ImportJobStatus::Completed),
            "failed" => Ok(ImportJobStatus::Failed),
            "rolled_back" => Ok(ImportJobStatus::RolledBack),
            other => Err(format!("Unknown import job status: '{other}'")),
        }
    }
}

/// One import batch as recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportJob {
    pub id: ImportJobId,
    pub kind: ImportKind,
    pub source: String,
    pub status: ImportJobStatus,
    pub total_rows: i64,
    pub imported_count: i64,
    /// Failed rows, duplicates included.
    pub failed_count: i64,
    /// Rows rejected as duplicates.
    pub skipped_count: i64,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ImportJob {
    /// Only a completed batch has records that can be taken back out.
    pub fn can_roll_back(&self) -> bool {
        self.status == ImportJobStatus::Completed
    }
}

/// Fields written when a job is opened in the `pending` state.
#[derive(Debug, Clone, PartialEq)]
pub struct NewImportJob {
    pub kind: ImportKind,
    pub source: String,
    pub total_rows: i64,
}

/// The single terminal write that closes a job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub status: ImportJobStatus,
    pub imported_count: i64,
    pub failed_count: i64,
    pub skipped_count: i64,
    pub error_message: Option<String>,
}

impl JobOutcome {
    /// A batch fails only when rows were attempted and none of them succeeded.
    pub fn from_counts(attempted: usize, succeeded: usize, failed: usize, duplicates: usize) -> Self {
        let status = if succeeded > 0 || attempted == 0 {
            ImportJobStatus::Completed
        } else {
            ImportJobStatus::Failed
        };
        let error_message = (status == ImportJobStatus::Failed)
            .then(|| format!("All {attempted} rows failed to import"));
        Self {
            status,
            imported_count: succeeded as i64,
            failed_count: failed as i64,
            skipped_count: duplicates as i64,
            error_message,
        }
    }

    /// Outcome for a batch aborted by a persistence failure.
    pub fn aborted(attempted: usize, message: impl Into<String>) -> Self {
        Self {
            status: ImportJobStatus::Failed,
            imported_count: 0,
            failed_count: attempted as i64,
            skipped_count: 0,
            error_message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_roundtrip() {
        for status in [
            ImportJobStatus::Pending,
            ImportJobStatus::Completed,
            ImportJobStatus::Failed,
            ImportJobStatus::RolledBack,
        ] {
            assert_eq!(ImportJobStatus::from_str(&status.to_string()).unwrap(), status);
        }
        assert!(ImportJobStatus::from_str("done").is_err());
    }

    #[test]
    fn kind_roundtrip() {
        assert_eq!(ImportKind::from_str("income").unwrap(), ImportKind::Income);
        assert_eq!(ImportKind::Expense.to_string(), "expense");
    }

    #[test]
    fn mixed_results_complete() {
        let outcome = JobOutcome::from_counts(5, 2, 3, 1);
        assert_eq!(outcome.status, ImportJobStatus::Completed);
        assert_eq!(outcome.imported_count, 2);
        assert_eq!(outcome.failed_count, 3);
        assert_eq!(outcome.skipped_count, 1);
        assert!(outcome.error_message.is_none());
    }

    #[test]
    fn empty_batch_completes() {
        assert_eq!(JobOutcome::from_counts(0, 0, 0, 0).status, ImportJobStatus::Completed);
    }

    #[test]
    fn all_rows_failing_fails() {
        let outcome = JobOutcome::from_counts(3, 0, 3, 0);
        assert_eq!(outcome.status, ImportJobStatus::Failed);
        assert!(outcome.error_message.is_some());
    }

    #[test]
    fn serializes_rolled_back_camel_case() {
        assert_eq!(
            serde_json::to_string(&ImportJobStatus::RolledBack).unwrap(),
            "\"rolledBack\""
        );
    }
}
