//! SQLite-backed record store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use pairbook_storage::{Database, StorageError};

use crate::error::RecordError;
use crate::model::{CurrencyPair, ImageDescription, ImageId, ImageRecord, PairId};
use crate::store::RecordStore;
use crate::Result;

pub struct SqliteRecordStore {
    db: Database,
}

impl SqliteRecordStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Run blocking SQLite work off the async runtime.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db)).await?
    }
}

impl Clone for SqliteRecordStore {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

fn parse_timestamp(id: &str, value: &str) -> std::result::Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt {
            id: id.to_string(),
            reason: format!("bad timestamp {value:?}: {e}"),
        })
}

/// A row whose columns fail to decode is logged and dropped so the rest of
/// the collection is still served. Any other error, such as a failed step,
/// is passed on.
fn skip_unreadable<T>(
    kind: &'static str,
    row: rusqlite::Result<T>,
) -> rusqlite::Result<Option<T>> {
    match row {
        Ok(value) => Ok(Some(value)),
        Err(
            e @ (rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::IntegralValueOutOfRange(..)),
        ) => {
            tracing::warn!(kind, error = %e, "Skipping unreadable row");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn skip_corrupt<T>(kind: &'static str, record: std::result::Result<T, StorageError>) -> Option<T> {
    match record {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(kind, error = %e, "Skipping corrupt record");
            None
        }
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn create_pair(&self, name: &str) -> Result<PairId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RecordError::EmptyName);
        }

        let pair = CurrencyPair::new(name.to_string());
        let id = pair.id.clone();

        self.run(move |db| {
            db.with_connection(|conn| {
                conn.execute(
                    "INSERT INTO pairs (id, name, created_at) VALUES (?1, ?2, ?3)",
                    rusqlite::params![pair.id.as_str(), pair.name, pair.created_at.to_rfc3339()],
                )?;
                Ok(())
            })?;
            Ok(())
        })
        .await?;

        tracing::info!(pair_id = %id, pair_name = %name, "Created pair");

        Ok(id)
    }

    async fn list_pairs(&self) -> Result<Vec<CurrencyPair>> {
        self.run(|db| {
            let rows = db.with_connection(|conn| {
                let mut stmt =
                    conn.prepare("SELECT id, name, created_at FROM pairs ORDER BY rowid")?;

                let rows: Vec<(String, String, String)> = stmt
                    .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
                    .filter_map(|r| skip_unreadable("pair", r).transpose())
                    .collect::<rusqlite::Result<_>>()?;

                Ok(rows)
            })?;

            let pairs = rows
                .into_iter()
                .filter_map(|(id, name, created_str)| {
                    let created_at = parse_timestamp(&id, &created_str).map(|created_at| {
                        CurrencyPair {
                            id: PairId::from(id),
                            name,
                            created_at,
                        }
                    });
                    skip_corrupt("pair", created_at)
                })
                .collect();

            Ok(pairs)
        })
        .await
    }

    async fn delete_pair(&self, pair_id: &PairId) -> Result<bool> {
        let id = pair_id.clone();

        let existed = self
            .run(move |db| {
                let existed = db.transaction(|conn| {
                    conn.execute("DELETE FROM images WHERE pair_id = ?1", [id.as_str()])?;
                    conn.execute("DELETE FROM descriptions WHERE pair_id = ?1", [id.as_str()])?;
                    let removed = conn.execute("DELETE FROM pairs WHERE id = ?1", [id.as_str()])?;
                    Ok(removed > 0)
                })?;
                Ok(existed)
            })
            .await?;

        tracing::info!(pair_id = %pair_id, existed, "Deleted pair");

        Ok(existed)
    }

    async fn create_image(&self, pair_id: &PairId, bytes: Vec<u8>) -> Result<ImageId> {
        let image = ImageRecord::new(pair_id.clone(), bytes);
        let id = image.id.clone();
        let size = image.bytes.len();

        self.run(move |db| {
            db.with_connection(|conn| {
                conn.execute(
                    "INSERT INTO images (id, pair_id, bytes, digest, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![
                        image.id.as_str(),
                        image.pair_id.as_str(),
                        image.bytes,
                        image.digest,
                        image.created_at.to_rfc3339(),
                    ],
                )?;
                Ok(())
            })?;
            Ok(())
        })
        .await?;

        tracing::info!(pair_id = %pair_id, image_id = %id, size, "Stored image");

        Ok(id)
    }

    async fn list_images(&self, pair_id: &PairId) -> Result<Vec<ImageRecord>> {
        let pair_id = pair_id.clone();

        self.run(move |db| {
            let rows = db.with_connection(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, bytes, digest, created_at FROM images
                     WHERE pair_id = ?1 ORDER BY rowid",
                )?;

                let rows: Vec<(String, Vec<u8>, String, String)> = stmt
                    .query_map([pair_id.as_str()], |row| {
                        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                    })?
                    .filter_map(|r| skip_unreadable("image", r).transpose())
                    .collect::<rusqlite::Result<_>>()?;

                Ok(rows)
            })?;

            let images = rows
                .into_iter()
                .filter_map(|(id, bytes, digest, created_str)| {
                    let image = parse_timestamp(&id, &created_str).and_then(|created_at| {
                        let image = ImageRecord {
                            id: ImageId::from(id),
                            pair_id: pair_id.clone(),
                            bytes,
                            digest,
                            created_at,
                        };
                        if image.is_intact() {
                            Ok(image)
                        } else {
                            Err(StorageError::Corrupt {
                                id: image.id.to_string(),
                                reason: "payload does not match its digest".to_string(),
                            })
                        }
                    });
                    skip_corrupt("image", image)
                })
                .collect();

            Ok(images)
        })
        .await
    }

    async fn upsert_description(
        &self,
        pair_id: &PairId,
        image_key: &str,
        text: &str,
    ) -> Result<()> {
        let pair_id = pair_id.clone();
        let image_key = image_key.to_string();
        let text = text.to_string();
        let updated_at = Utc::now().to_rfc3339();

        self.run(move |db| {
            db.with_connection(|conn| {
                conn.execute(
                    "INSERT INTO descriptions (id, pair_id, image_key, text, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT (pair_id, image_key)
                     DO UPDATE SET text = excluded.text, updated_at = excluded.updated_at",
                    rusqlite::params![
                        Uuid::new_v4().to_string(),
                        pair_id.as_str(),
                        image_key,
                        text,
                        updated_at,
                    ],
                )?;
                Ok(())
            })?;

            tracing::debug!(pair_id = %pair_id, image_key = %image_key, "Saved description");

            Ok(())
        })
        .await
    }

    async fn list_descriptions(&self, pair_id: &PairId) -> Result<Vec<ImageDescription>> {
        let pair_id = pair_id.clone();

        self.run(move |db| {
            let rows = db.with_connection(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, image_key, text, updated_at FROM descriptions
                     WHERE pair_id = ?1 ORDER BY rowid",
                )?;

                let rows: Vec<(String, String, String, String)> = stmt
                    .query_map([pair_id.as_str()], |row| {
                        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                    })?
                    .filter_map(|r| skip_unreadable("description", r).transpose())
                    .collect::<rusqlite::Result<_>>()?;

                Ok(rows)
            })?;

            let descriptions = rows
                .into_iter()
                .filter_map(|(id, image_key, text, updated_str)| {
                    let description =
                        parse_timestamp(&id, &updated_str).map(|updated_at| ImageDescription {
                            id,
                            pair_id: pair_id.clone(),
                            image_key,
                            text,
                            updated_at,
                        });
                    skip_corrupt("description", description)
                })
                .collect();

            Ok(descriptions)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn store() -> SqliteRecordStore {
        SqliteRecordStore::new(Database::open_in_memory().unwrap())
    }

    #[tokio::test]
    async fn test_create_and_list_pairs() {
        let store = store();

        let btc = store.create_pair("BTC/USD").await.unwrap();
        let eur = store.create_pair("  EUR/USD ").await.unwrap();

        let pairs = store.list_pairs().await.unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].id, btc);
        assert_eq!(pairs[0].name, "BTC/USD");
        assert_eq!(pairs[1].id, eur);
        assert_eq!(pairs[1].name, "EUR/USD");
    }

    #[tokio::test]
    async fn test_empty_pair_name_rejected() {
        let store = store();
        assert!(matches!(
            store.create_pair("   ").await,
            Err(RecordError::EmptyName)
        ));
        assert!(store.list_pairs().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_pair_ids_are_unique() {
        let store = Arc::new(store());

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.create_pair(&format!("PAIR{i}/USD")).await })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            assert!(ids.insert(handle.await.unwrap().unwrap()));
        }
        assert_eq!(ids.len(), 32);
        assert_eq!(store.list_pairs().await.unwrap().len(), 32);
    }

    #[tokio::test]
    async fn test_images_round_trip_in_insertion_order() {
        let store = store();
        let pair = store.create_pair("BTC/USD").await.unwrap();

        let a = store.create_image(&pair, vec![0xAA; 16]).await.unwrap();
        let b = store.create_image(&pair, vec![0xBB, 0x00, 0xBB]).await.unwrap();

        let images = store.list_images(&pair).await.unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].id, a);
        assert_eq!(images[0].bytes, vec![0xAA; 16]);
        assert_eq!(images[1].id, b);
        assert_eq!(images[1].bytes, vec![0xBB, 0x00, 0xBB]);
        assert!(images.iter().all(|i| i.pair_id == pair));
    }

    #[tokio::test]
    async fn test_images_are_scoped_to_their_pair() {
        let store = store();
        let btc = store.create_pair("BTC/USD").await.unwrap();
        let eth = store.create_pair("ETH/USD").await.unwrap();

        store.create_image(&btc, vec![1]).await.unwrap();
        store.create_image(&eth, vec![2]).await.unwrap();
        store.create_image(&eth, vec![3]).await.unwrap();

        assert_eq!(store.list_images(&btc).await.unwrap().len(), 1);
        assert_eq!(store.list_images(&eth).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_parent_reads_are_empty() {
        let store = store();
        let unknown = PairId::new();

        assert!(store.list_images(&unknown).await.unwrap().is_empty());
        assert!(store.list_descriptions(&unknown).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_orphaned_image_is_readable() {
        let store = store();
        let orphan_parent = PairId::from("never-created");

        store.create_image(&orphan_parent, vec![7, 7]).await.unwrap();

        let images = store.list_images(&orphan_parent).await.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].bytes, vec![7, 7]);
    }

    #[tokio::test]
    async fn test_description_upsert_is_idempotent() {
        let store = store();
        let pair = store.create_pair("BTC/USD").await.unwrap();
        let image = store.create_image(&pair, b"A".to_vec()).await.unwrap();

        store
            .upsert_description(&pair, image.as_str(), "chart 1")
            .await
            .unwrap();
        store
            .upsert_description(&pair, image.as_str(), "chart 1")
            .await
            .unwrap();

        let descriptions = store.list_descriptions(&pair).await.unwrap();
        assert_eq!(descriptions.len(), 1);
        assert_eq!(descriptions[0].image_key, image.as_str());
        assert_eq!(descriptions[0].text, "chart 1");

        store
            .upsert_description(&pair, image.as_str(), "chart 1 updated")
            .await
            .unwrap();

        let descriptions = store.list_descriptions(&pair).await.unwrap();
        assert_eq!(descriptions.len(), 1);
        assert_eq!(descriptions[0].text, "chart 1 updated");
    }

    #[tokio::test]
    async fn test_same_image_key_under_different_pairs() {
        let store = store();
        let btc = store.create_pair("BTC/USD").await.unwrap();
        let eth = store.create_pair("ETH/USD").await.unwrap();

        store.upsert_description(&btc, "key", "btc").await.unwrap();
        store.upsert_description(&eth, "key", "eth").await.unwrap();

        assert_eq!(store.list_descriptions(&btc).await.unwrap()[0].text, "btc");
        assert_eq!(store.list_descriptions(&eth).await.unwrap()[0].text, "eth");
    }

    #[tokio::test]
    async fn test_delete_pair_cascades() {
        let store = store();
        let btc = store.create_pair("BTC/USD").await.unwrap();
        let eth = store.create_pair("ETH/USD").await.unwrap();

        let image = store.create_image(&btc, vec![1, 2, 3]).await.unwrap();
        store
            .upsert_description(&btc, image.as_str(), "gone soon")
            .await
            .unwrap();
        store.create_image(&eth, vec![4]).await.unwrap();

        assert!(store.delete_pair(&btc).await.unwrap());
        assert!(!store.delete_pair(&btc).await.unwrap());

        assert!(store.list_images(&btc).await.unwrap().is_empty());
        assert!(store.list_descriptions(&btc).await.unwrap().is_empty());
        assert_eq!(store.list_images(&eth).await.unwrap().len(), 1);

        let pairs = store.list_pairs().await.unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].id, eth);
    }

    #[tokio::test]
    async fn test_corrupt_image_is_skipped() {
        let store = store();
        let pair = store.create_pair("BTC/USD").await.unwrap();
        let good = store.create_image(&pair, vec![1, 2, 3]).await.unwrap();

        store
            .database()
            .with_connection(|conn| {
                conn.execute(
                    "INSERT INTO images (id, pair_id, bytes, digest, created_at)
                     VALUES ('bad-digest', ?1, x'00', 'not-a-digest', ?2)",
                    rusqlite::params![pair.as_str(), Utc::now().to_rfc3339()],
                )?;
                conn.execute(
                    "INSERT INTO images (id, pair_id, bytes, digest, created_at)
                     VALUES ('bad-time', ?1, x'00', ?2, 'yesterday')",
                    rusqlite::params![pair.as_str(), crate::digest_bytes(&[0])],
                )?;
                // Text where the payload blob belongs
                conn.execute(
                    "INSERT INTO images (id, pair_id, bytes, digest, created_at)
                     VALUES ('text-bytes', ?1, 'not a blob', ?2, ?3)",
                    rusqlite::params![
                        pair.as_str(),
                        crate::digest_bytes(b"not a blob"),
                        Utc::now().to_rfc3339()
                    ],
                )?;
                Ok(())
            })
            .unwrap();

        let images = store.list_images(&pair).await.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].id, good);
    }

    #[test]
    fn test_only_decode_errors_are_skipped() {
        let decode = rusqlite::Error::InvalidColumnType(
            1,
            "bytes".to_string(),
            rusqlite::types::Type::Text,
        );
        assert!(matches!(skip_unreadable::<()>("image", Err(decode)), Ok(None)));

        let io = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_IOERR),
            None,
        );
        assert!(matches!(
            skip_unreadable::<()>("image", Err(io)),
            Err(rusqlite::Error::SqliteFailure(..))
        ));

        assert!(matches!(skip_unreadable("image", Ok(7)), Ok(Some(7))));
    }

    #[tokio::test]
    async fn test_corrupt_description_is_skipped() {
        let store = store();
        let pair = store.create_pair("BTC/USD").await.unwrap();
        store.upsert_description(&pair, "k1", "fine").await.unwrap();

        store
            .database()
            .with_connection(|conn| {
                conn.execute(
                    "INSERT INTO descriptions (id, pair_id, image_key, text, updated_at)
                     VALUES ('d2', ?1, 'k2', 'broken', 'not a date')",
                    [pair.as_str()],
                )?;
                Ok(())
            })
            .unwrap();

        let descriptions = store.list_descriptions(&pair).await.unwrap();
        assert_eq!(descriptions.len(), 1);
        assert_eq!(descriptions[0].image_key, "k1");
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = std::env::temp_dir().join(format!("pairbook-records-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("pairbook.db");

        let (pair, image) = {
            let store = SqliteRecordStore::new(Database::open(&path).unwrap());
            let pair = store.create_pair("GBP/JPY").await.unwrap();
            let image = store.create_image(&pair, vec![9; 64]).await.unwrap();
            store
                .upsert_description(&pair, image.as_str(), "weekly")
                .await
                .unwrap();
            (pair, image)
        };

        let store = SqliteRecordStore::new(Database::open(&path).unwrap());
        let pairs = store.list_pairs().await.unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].id, pair);

        let images = store.list_images(&pair).await.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].id, image);

        let descriptions = store.list_descriptions(&pair).await.unwrap();
        assert_eq!(descriptions[0].image_key, image.as_str());
        assert_eq!(descriptions[0].text, "weekly");

        drop(store);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
