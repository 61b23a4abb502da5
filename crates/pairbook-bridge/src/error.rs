//! Bridge error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Store error: {0}")]
    Store(#[from] pairbook_records::RecordError),

    #[error("Storage host did not answer within {0} ms")]
    Timeout(u64),
}
