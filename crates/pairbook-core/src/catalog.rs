//! Catalogue lifecycle
//!
//! [`Catalog`] is built once at startup and handed to whatever needs it.
//! It owns the storage host for as long as it lives; [`Catalog::shutdown`]
//! tears everything down.

use std::sync::Arc;

use pairbook_bridge::{PairItem, Request, Response, StorageBridge, StorageHost};
use pairbook_records::{PairId, SqliteRecordStore};
use pairbook_storage::Database;
use pairbook_upload::UploadPipeline;

use crate::config::Config;
use crate::error::CoreError;
use crate::Result;

pub struct Catalog {
    config: Config,
    /// `None` when running without persistence
    host: Option<StorageHost>,
    bridge: StorageBridge,
    uploads: UploadPipeline,
}

impl Catalog {
    /// Open the database named in `config` and start the storage host.
    pub async fn open(config: Config) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let path = config.database_path.clone();
        let db = tokio::task::spawn_blocking(move || Database::open(path))
            .await
            .map_err(|e| CoreError::Io(std::io::Error::other(e)))??;

        let store = Arc::new(SqliteRecordStore::new(db));
        let (host, bridge) = StorageHost::spawn(store);
        let bridge = bridge.with_timeout(config.bridge_timeout());
        let uploads = UploadPipeline::new(bridge.clone(), config.max_upload_bytes);

        tracing::info!(
            path = %config.database_path.display(),
            "Catalog opened"
        );

        Ok(Self {
            config,
            host: Some(host),
            bridge,
            uploads,
        })
    }

    /// A catalogue with no storage behind it. Everything works, nothing
    /// is kept.
    pub fn detached(config: Config) -> Self {
        let bridge = StorageBridge::detached().with_timeout(config.bridge_timeout());
        let uploads = UploadPipeline::new(bridge.clone(), config.max_upload_bytes);

        Self {
            config,
            host: None,
            bridge,
            uploads,
        }
    }

    /// Open normally, or fall back to [`Catalog::detached`] if storage is
    /// unavailable.
    pub async fn open_or_detached(config: Config) -> Self {
        match Self::open(config.clone()).await {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::error!(
                    path = %config.database_path.display(),
                    error = %e,
                    "Storage unavailable, running without persistence"
                );
                Self::detached(config)
            }
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.host.is_some()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn bridge(&self) -> &StorageBridge {
        &self.bridge
    }

    pub fn uploads(&self) -> &UploadPipeline {
        &self.uploads
    }

    // === Pair operations ===

    pub async fn add_pair(&self, name: &str) -> Result<PairId> {
        let response = self
            .bridge
            .invoke(Request::SavePair {
                name: name.to_string(),
            })
            .await?;

        match response {
            Response::PairSaved { id } => Ok(id),
            other => Err(CoreError::UnexpectedResponse(other.kind())),
        }
    }

    pub async fn pairs(&self) -> Result<Vec<PairItem>> {
        match self.bridge.invoke(Request::LoadPairs).await? {
            Response::Pairs { items } => Ok(items),
            other => Err(CoreError::UnexpectedResponse(other.kind())),
        }
    }

    /// Remove a pair card. Its images and descriptions go with it.
    pub async fn remove_pair(&self, pair_id: &PairId) -> Result<bool> {
        let response = self
            .bridge
            .invoke(Request::DeletePair {
                parent_id: pair_id.clone(),
            })
            .await?;

        match response {
            Response::PairDeleted { ok } => Ok(ok),
            other => Err(CoreError::UnexpectedResponse(other.kind())),
        }
    }

    pub async fn shutdown(self) {
        if let Some(host) = self.host {
            host.shutdown().await;
        }
        tracing::info!("Catalog closed");
    }
}
