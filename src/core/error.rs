//! Error types for the federation core.

use crate::core::types::RoundId;
use crate::federation::round::RoundStatus;
use crate::federation::validator::RejectReason;
use thiserror::Error;

/// Result type alias for federation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in federation operations.
#[derive(Error, Debug)]
pub enum Error {
    // Identity errors
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    // Submission errors (recoverable, reported to the submitter)
    #[error("submission rejected: {0}")]
    SubmissionRejected(RejectReason),

    // Round lifecycle errors
    #[error("round {0} is unknown")]
    RoundUnknown(RoundId),

    #[error("round {round_id} already open for model kind {model_kind}")]
    RoundAlreadyOpen {
        model_kind: String,
        round_id: RoundId,
    },

    #[error("invalid transition for round {round_id}: {from} -> {to}")]
    InvalidTransition {
        round_id: RoundId,
        from: RoundStatus,
        to: RoundStatus,
    },

    // Policy errors (terminal for the round)
    #[error("round {round_id} has {got} participants, {required} required")]
    InsufficientParticipants {
        round_id: RoundId,
        got: usize,
        required: usize,
    },

    #[error("cannot aggregate an empty cohort")]
    EmptyCohort,

    #[error("aggregation failed: {0}")]
    Aggregation(String),

    // Configuration errors
    #[error("no vector schema configured for model kind {0}")]
    SchemaMissing(String),

    // Privacy-parameter misconfiguration (fatal at round-open time)
    #[error("invalid privacy parameter: {0}")]
    InvalidPrivacyParameter(String),

    // Store errors
    #[error("a model version already exists for round {0}")]
    DuplicateRound(RoundId),

    #[error("no model version stored for round {0}")]
    VersionNotFound(RoundId),

    #[error("no released model version available")]
    NoReleasedModel,

    // Serialization errors
    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl Error {
    /// Whether the caller may retry the same operation (possibly against a
    /// different round) after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::SubmissionRejected(_)
                | Error::RoundUnknown(_)
                | Error::RoundAlreadyOpen { .. }
                | Error::InvalidTransition { .. }
                | Error::Io(_)
        )
    }
}
