use thiserror::Error;

/// Errors returned by every store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row matched the requested id, or an update targeting an id touched nothing.
    #[error("record not found")]
    NotFound,

    /// An insert that should have produced a row did not.
    #[error("record not inserted")]
    NotInserted,

    #[error("database error: {0}")]
    Database(rusqlite::Error),

    #[error("connection lock poisoned: {0}")]
    LockPoisoned(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
            other => StoreError::Database(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
