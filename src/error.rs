use crate::store::StoreError;

pub const STORE_UNCONFIGURED: &str = "Server record store is not configured.";
pub const INVALID_JSON: &str = "Invalid JSON body.";

/// Client-caused problems with a payload; never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{message}")]
    MissingField { message: &'static str },
    #[error("{field} must be at most {max} characters.")]
    TooLong { field: String, max: u64 },
    #[error("Unknown category \"{0}\".")]
    UnknownCategory(String),
}

impl ValidationError {
    pub fn missing(message: &'static str) -> Self {
        ValidationError::MissingField { message }
    }
}

/// Outcome of a failed workflow call, mapped onto HTTP statuses by the handlers.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    InsertFailed(StoreError),
    #[error("{0}")]
    DeleteFailed(StoreError),
    #[error("record store query failed: {0}")]
    StoreReadFailed(StoreError),
    #[error("This suggestion is already being promoted.")]
    PromotionInProgress,
    #[error("Suggestion not found.")]
    SuggestionNotFound,
    #[error("{STORE_UNCONFIGURED}")]
    StoreUnconfigured,
}
