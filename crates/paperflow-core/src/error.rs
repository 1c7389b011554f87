//! Workflow errors

use paperflow_client::StoreError;
use thiserror::Error;
use uuid::Uuid;

/// Why a workflow refused to issue any write
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Skip {
    #[error("no section selected")]
    NoActiveSection,

    #[error("no recipients given")]
    EmptyRecipients,

    #[error("note text is empty")]
    EmptyNote,

    #[error("invalid note: {0}")]
    InvalidNote(String),

    #[error("invalid section: {0}")]
    InvalidSection(String),

    #[error("nothing to update")]
    EmptyPatch,

    #[error("unknown record {0}")]
    UnknownRecord(Uuid),

    #[error("push {0} has every acknowledgment")]
    NoFanoutGap(Uuid),

    #[error("acknowledgments for push {0} are still being written")]
    FanoutInFlight(Uuid),
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Input was refused; nothing was written and the cache is untouched
    #[error("skipped: {0}")]
    Skipped(Skip),

    /// The remote write failed; the cache is untouched
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The push was written but its acknowledgment stubs were not
    #[error("push {push_id} created without acknowledgments: {source}")]
    PartialFanout {
        push_id: Uuid,
        #[source]
        source: StoreError,
    },
}

impl From<Skip> for WorkflowError {
    fn from(skip: Skip) -> Self {
        WorkflowError::Skipped(skip)
    }
}

impl WorkflowError {
    pub fn is_skipped(&self) -> bool {
        matches!(self, WorkflowError::Skipped(_))
    }
}

pub type WorkflowResult<T> = std::result::Result<T, WorkflowError>;
