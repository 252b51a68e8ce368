use thiserror::Error;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum StoreError {
    #[error("report not found: {0}")]
    NotFound(String),
    #[error("draft not found: {0}")]
    DraftNotFound(String),
    #[error("io failure: {0}")]
    Io(String),
    #[error("snapshot corrupt: {0}")]
    Corrupt(String),
    #[error("snapshot encode failed: {0}")]
    Encode(String),
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        StoreError::Io(value.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
