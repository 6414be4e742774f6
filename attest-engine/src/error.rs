use attest_api::error::ApiError;
use attest_api::types::Phase;
use thiserror::Error;

/// Error types for the session engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// No usable system/user/round context; nothing to recover
    #[error("Missing assessment context: {message}")]
    ContextMissing { message: String },

    /// The backend has no questions for this system and phase
    #[error("No {phase} catalog available for system {system_id}")]
    CatalogUnavailable {
        phase: Phase,
        system_id: i64,
        #[source]
        source: Option<ApiError>,
    },

    /// The organization profile has an unanswered field
    #[error("Assessment profile is missing {field}")]
    ProfileIncomplete { field: &'static str },

    /// The assessment registration could not be checked or stored
    #[error("Assessment registration failed: {source}")]
    RegistrationFailed {
        #[source]
        source: ApiError,
    },

    /// The next-round lookup failed; a round cannot open without it
    #[error("Round lookup failed: {source}")]
    RoundLookupFailed {
        #[source]
        source: ApiError,
    },

    /// The response batch was not persisted server-side
    #[error("Submitting {phase} responses failed: {source}")]
    SubmissionFailed {
        phase: Phase,
        #[source]
        source: ApiError,
    },

    /// Round completion failed after the qualitative batch landed
    #[error("Round completion failed: {source}")]
    RoundCompletionFailed {
        #[source]
        source: ApiError,
    },

    /// The evidence file was rejected before any network call
    #[error("File type not accepted: {file_name}")]
    UploadRejected { file_name: String },

    /// The evidence upload failed; the previous attachment is untouched
    #[error("Upload failed: {source}")]
    UploadFailed {
        #[source]
        source: ApiError,
    },

    /// A submission is already in flight for this session
    #[error("A submission is already in flight")]
    SubmissionInFlight,

    /// A submission outcome arrived with none in flight
    #[error("No submission in flight to resolve")]
    NotSubmitting,

    /// The phase was already submitted; the session is read-only
    #[error("The {phase} phase is already completed")]
    PhaseCompleted { phase: Phase },

    /// The question number is outside the active catalog
    #[error("Question {question_number} is not in the active catalog")]
    UnknownQuestion { question_number: u32 },
}

impl EngineError {
    /// Create a context error
    pub fn context_missing<S: Into<String>>(message: S) -> Self {
        Self::ContextMissing {
            message: message.into(),
        }
    }

    /// Fatal errors end the session and route the user away; everything
    /// else supports retrying the same action with entered data intact
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ContextMissing { .. } | Self::CatalogUnavailable { .. }
        )
    }
}

/// Error types for draft persistence
///
/// Store failures are non-fatal to a session: the engine logs them and
/// continues, losing only reload survival.
#[derive(Error, Debug)]
pub enum DraftError {
    /// Backing storage rejected the operation
    #[error("Draft storage error: {message}")]
    Storage { message: String },

    /// SQLite error from the on-disk store
    #[error("Draft database error: {source}")]
    Database {
        #[from]
        source: rusqlite::Error,
    },
}

impl DraftError {
    /// Create a storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}
