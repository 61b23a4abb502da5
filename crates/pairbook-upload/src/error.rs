//! Upload error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },

    #[error("File is empty")]
    Empty,

    #[error("Bridge error: {0}")]
    Bridge(#[from] pairbook_bridge::BridgeError),

    #[error("Unexpected response from storage host: {0}")]
    UnexpectedResponse(&'static str),

    #[error("Invalid display handle: {0}")]
    Handle(#[from] url::ParseError),
}
