//! Pairbook Upload Pipeline
//!
//! Reads user-selected files, hands their bytes to the storage bridge and
//! gives the UI a [`DisplayHandle`] it can render straight away.

mod display;
mod error;
mod pipeline;

pub use display::{sniff_mime, DisplayHandle};
pub use error::UploadError;
pub use pipeline::{
    GalleryItem, SelectedFile, UploadFailure, UploadOutcome, UploadPipeline, UploadReport,
    UploadedImage, DEFAULT_MAX_UPLOAD_BYTES,
};

pub type Result<T> = std::result::Result<T, UploadError>;
