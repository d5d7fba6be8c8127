use std::sync::PoisonError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("Trade {0} not found")]
    NotFound(i64),

    #[error("Invalid field `{field}`: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Set counter row is missing")]
    CounterMissing,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,
}

impl JournalError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        JournalError::Validation {
            field,
            message: message.into(),
        }
    }
}

impl<T> From<PoisonError<T>> for JournalError {
    fn from(_: PoisonError<T>) -> Self {
        JournalError::LockPoisoned
    }
}
