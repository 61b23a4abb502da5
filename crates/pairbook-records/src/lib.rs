//! Pairbook Record Store
//!
//! Durable storage for the three entity kinds:
//! - Currency pairs, the top-level grouping
//! - Images uploaded against a pair
//! - Free-text descriptions, one per image
//!
//! Every caller goes through [`RecordStore`]; [`SqliteRecordStore`] is the
//! only implementation.

mod error;
mod model;
mod sqlite;
mod store;

pub use error::RecordError;
pub use model::{digest_bytes, CurrencyPair, ImageDescription, ImageId, ImageRecord, PairId};
pub use sqlite::SqliteRecordStore;
pub use store::RecordStore;

pub type Result<T> = std::result::Result<T, RecordError>;
