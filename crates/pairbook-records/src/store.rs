//! Record store interface

use async_trait::async_trait;

use crate::model::{CurrencyPair, ImageDescription, ImageId, ImageRecord, PairId};
use crate::Result;

/// The persistence contract the catalogue UI is written against.
///
/// Exactly one implementation is chosen at startup and serves every
/// operation for the lifetime of the process. Reads keyed on a parent id
/// that does not exist return an empty sequence, never an error.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create a pair and return its freshly assigned id.
    async fn create_pair(&self, name: &str) -> Result<PairId>;

    /// All pairs, oldest first.
    async fn list_pairs(&self) -> Result<Vec<CurrencyPair>>;

    /// Delete a pair together with its images and descriptions.
    ///
    /// Returns `false` if no such pair existed.
    async fn delete_pair(&self, pair_id: &PairId) -> Result<bool>;

    /// Append an image. The store assigns id and timestamp.
    async fn create_image(&self, pair_id: &PairId, bytes: Vec<u8>) -> Result<ImageId>;

    /// Images for a pair, in insertion order.
    async fn list_images(&self, pair_id: &PairId) -> Result<Vec<ImageRecord>>;

    /// Create or replace the description stored under `(pair_id, image_key)`.
    async fn upsert_description(&self, pair_id: &PairId, image_key: &str, text: &str)
        -> Result<()>;

    /// Descriptions for a pair, at most one per image key.
    async fn list_descriptions(&self, pair_id: &PairId) -> Result<Vec<ImageDescription>>;
}
