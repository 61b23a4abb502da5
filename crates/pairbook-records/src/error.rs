//! Record store error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Storage error: {0}")]
    Storage(#[from] pairbook_storage::StorageError),

    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Pair name cannot be empty")]
    EmptyName,
}

impl From<rusqlite::Error> for RecordError {
    fn from(e: rusqlite::Error) -> Self {
        RecordError::Storage(e.into())
    }
}
