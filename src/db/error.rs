use thiserror::Error;

/// Failures of the survey store.
///
/// `NotFound` and `InvalidState` are expected outcomes of user commands
/// (deleting something twice, moving the first item up); `Storage` wraps the
/// database error; `Validation` flags a malformed lookup or submission.
#[derive(Debug, Error)]
pub enum SurveyError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl SurveyError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

pub type StoreResult<T> = std::result::Result<T, SurveyError>;
