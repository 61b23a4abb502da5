//! Pairbook Core
//!
//! Wires the storage layer, record store, bridge and upload pipeline into a
//! single [`Catalog`] the presentation layer is given at startup.

mod catalog;
mod config;
mod error;

pub use catalog::Catalog;
pub use config::Config;
pub use error::CoreError;

// Re-export core components
pub use pairbook_bridge::{
    BridgeError, CommandResult, DescriptionItem, ImageItem, PairItem, Request, Response,
    StorageBridge, StorageHost,
};
pub use pairbook_records::{
    CurrencyPair, ImageDescription, ImageId, ImageRecord, PairId, RecordError, RecordStore,
    SqliteRecordStore,
};
pub use pairbook_storage::{Database, StorageError};
pub use pairbook_upload::{
    DisplayHandle, GalleryItem, SelectedFile, UploadError, UploadFailure, UploadOutcome,
    UploadPipeline, UploadReport, UploadedImage,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
///
/// Logs go to stderr so stdout stays free for the host protocol.
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
