use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QlkError {
    #[error("User specification error: {0}")]
    UserSpec(String),

    #[error("Consistency violation: {0}")]
    ConsistencyViolation(String),

    #[error("Size mismatch in '{name}': {len} values do not fit shape {expected:?}")]
    SizeMismatch {
        name: String,
        len: usize,
        expected: Vec<usize>,
    },

    #[error("Malformed number '{token}' in {file}")]
    MalformedNumber { file: String, token: String },

    #[error("Refusing to overwrite existing path {0}")]
    OverwriteConflict(PathBuf),

    #[error("{0} not implemented")]
    NotImplemented(String),

    #[error("Dataset archive error: {0}")]
    Archive(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type QlkResult<T> = Result<T, QlkError>;
