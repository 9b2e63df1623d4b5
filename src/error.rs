use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaverlyError {
    /// Bad input shape or range. Always local and recoverable; the caller
    /// re-prompts with a corrected value.
    #[error("validation failed for `{field}`: {message}")]
    Validation { field: String, message: String },

    /// The underlying settings/ledger store could not be read or written.
    /// Callers gating access on stored state must deny, not grant.
    #[error("storage unavailable: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} lock poisoned")]
    Lock(&'static str),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SaverlyError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SaverlyError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SaverlyError>;
