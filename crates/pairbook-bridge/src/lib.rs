//! Pairbook Storage Bridge
//!
//! The UI context cannot touch the disk. It sends [`Request`]s through a
//! [`StorageBridge`] to the [`StorageHost`], which owns the record store and
//! answers with a [`Response`]. No business logic lives here.
//!
//! When no host is reachable the bridge answers with placeholders so the UI
//! keeps working in a non-persistent mode.

mod bridge;
mod error;
mod host;
mod request;
mod result;

pub use bridge::{StorageBridge, DEFAULT_TIMEOUT};
pub use error::BridgeError;
pub use host::StorageHost;
pub use request::{DescriptionItem, ImageItem, PairItem, Request, Response};
pub use result::CommandResult;

pub type Result<T> = std::result::Result<T, BridgeError>;
