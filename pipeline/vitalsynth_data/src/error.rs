use std::path::PathBuf;

use thiserror::Error;

use crate::UserId;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing column '{column}' in {path}")]
    MissingColumn { column: String, path: PathBuf },
    #[error("Empty input: {0}")]
    EmptyInput(String),
    #[error("Unparsable timestamp '{value}' for user {user_id}")]
    BadTimestamp { user_id: UserId, value: String },
    #[error("Duplicate timestamp {time} for user {user_id}")]
    DuplicateTimestamp { user_id: UserId, time: String },
    #[error("Invalid wide-format glucose matrix: {0}")]
    BadMatrix(String),
    #[error("User {0} not found")]
    UnknownUser(UserId),
    #[error("User id {user_id} out of range (must be below {limit})")]
    UserOutOfRange { user_id: UserId, limit: UserId },
    #[error("Failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DataError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DataError::Io {
            path: path.into(),
            source,
        }
    }
}
