//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] pairbook_storage::StorageError),

    #[error("Record error: {0}")]
    Record(#[from] pairbook_records::RecordError),

    #[error("Bridge error: {0}")]
    Bridge(#[from] pairbook_bridge::BridgeError),

    #[error("Upload error: {0}")]
    Upload(#[from] pairbook_upload::UploadError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unexpected response from storage host: {0}")]
    UnexpectedResponse(&'static str),
}
