use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorshipError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Capacity exceeded: {0}")]
    Capacity(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl WorshipError {
    /// Shorthand for a 403 carrying the standard ownership message.
    pub fn forbidden() -> Self {
        WorshipError::Authorization("You do not have permission to perform this action".to_string())
    }

    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        WorshipError::NotFound(format!("{} with ID {} not found", entity, id))
    }
}

impl From<validator::ValidationErrors> for WorshipError {
    fn from(errors: validator::ValidationErrors) -> Self {
        WorshipError::Validation(errors.to_string())
    }
}

pub type WorshipResult<T> = Result<T, WorshipError>;
