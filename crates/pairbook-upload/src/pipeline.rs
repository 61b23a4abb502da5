//! Upload pipeline
//!
//! Every file of a selection is uploaded on its own task. Results are
//! collected in completion order and one bad file never stops the rest.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use pairbook_bridge::{Request, Response, StorageBridge};
use pairbook_records::{ImageId, PairId};

use crate::display::DisplayHandle;
use crate::error::UploadError;
use crate::Result;

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct SelectedFile {
    /// Name shown back to the user in reports
    pub name: String,
    pub path: PathBuf,
}

impl SelectedFile {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self { name, path }
    }
}

#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    /// `None` when the bridge had no storage host behind it
    pub image_id: Option<ImageId>,
    pub handle: DisplayHandle,
}

#[derive(Debug, Clone)]
pub struct UploadFailure {
    pub file_name: String,
    pub error: String,
}

#[derive(Debug, Clone)]
pub enum UploadOutcome {
    Uploaded(UploadedImage),
    Failed(UploadFailure),
}

#[derive(Debug, Default)]
pub struct UploadReport {
    /// Completion order, not selection order
    pub uploaded: Vec<UploadedImage>,
    pub failures: Vec<UploadFailure>,
}

impl UploadReport {
    fn push(&mut self, outcome: UploadOutcome) {
        match outcome {
            UploadOutcome::Uploaded(image) => self.uploaded.push(image),
            UploadOutcome::Failed(failure) => self.failures.push(failure),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One stored image ready for display, with its description if any.
#[derive(Debug, Clone)]
pub struct GalleryItem {
    pub image_id: ImageId,
    pub handle: DisplayHandle,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct UploadPipeline {
    bridge: StorageBridge,
    max_bytes: u64,
}

impl UploadPipeline {
    pub fn new(bridge: StorageBridge, max_bytes: u64) -> Self {
        Self { bridge, max_bytes }
    }

    pub fn bridge(&self) -> &StorageBridge {
        &self.bridge
    }

    /// Upload a whole selection for one pair.
    ///
    /// When `progress` is given, each outcome is also sent there as soon as
    /// it resolves so the UI can append it immediately.
    pub async fn upload(
        &self,
        pair_id: &PairId,
        files: Vec<SelectedFile>,
        progress: Option<mpsc::UnboundedSender<UploadOutcome>>,
    ) -> UploadReport {
        let mut tasks = JoinSet::new();

        for file in files {
            let pipeline = self.clone();
            let pair_id = pair_id.clone();

            tasks.spawn(async move {
                let result = pipeline.upload_file(&pair_id, &file).await;
                match result {
                    Ok(image) => UploadOutcome::Uploaded(image),
                    Err(e) => {
                        tracing::warn!(
                            pair_id = %pair_id,
                            file = %file.name,
                            error = %e,
                            "Image upload failed"
                        );
                        UploadOutcome::Failed(UploadFailure {
                            file_name: file.name,
                            error: e.to_string(),
                        })
                    }
                }
            });
        }

        let mut report = UploadReport::default();
        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(error = %e, "Upload task aborted");
                    UploadOutcome::Failed(UploadFailure {
                        file_name: String::new(),
                        error: e.to_string(),
                    })
                }
            };

            if let Some(tx) = &progress {
                let _ = tx.send(outcome.clone());
            }
            report.push(outcome);
        }

        tracing::info!(
            pair_id = %pair_id,
            uploaded = report.uploaded.len(),
            failed = report.failures.len(),
            "Upload finished"
        );

        report
    }

    /// Read one file fully and upload it.
    pub async fn upload_file(&self, pair_id: &PairId, file: &SelectedFile) -> Result<UploadedImage> {
        let size = tokio::fs::metadata(&file.path).await?.len();
        if size > self.max_bytes {
            return Err(UploadError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }

        let bytes = tokio::fs::read(&file.path).await?;
        self.upload_bytes(pair_id, &file.name, bytes).await
    }

    /// Upload an in-memory payload. The display handle is built from the
    /// payload itself, not from a round trip through the store.
    pub async fn upload_bytes(
        &self,
        pair_id: &PairId,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedImage> {
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        let size = bytes.len() as u64;
        if size > self.max_bytes {
            return Err(UploadError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }

        let handle = DisplayHandle::new(bytes.as_slice())?;

        let response = self
            .bridge
            .invoke(Request::SaveImage {
                parent_id: pair_id.clone(),
                bytes,
            })
            .await?;

        // Store failures arrive as bridge errors, so a save that answers was kept
        let image_id = match response {
            Response::ImageSaved { id, .. } => id,
            other => return Err(UploadError::UnexpectedResponse(other.kind())),
        };

        tracing::debug!(
            pair_id = %pair_id,
            file = %file_name,
            size,
            handle = %handle.url(),
            "Uploaded image"
        );

        Ok(UploadedImage {
            file_name: file_name.to_string(),
            image_id,
            handle,
        })
    }

    /// Save the description for an image, keyed on its durable id.
    pub async fn describe(&self, pair_id: &PairId, image_id: &ImageId, text: &str) -> Result<()> {
        let response = self
            .bridge
            .invoke(Request::SaveDescription {
                parent_id: pair_id.clone(),
                image_key: image_id.to_string(),
                text: text.to_string(),
            })
            .await?;

        match response {
            Response::DescriptionSaved { .. } => Ok(()),
            other => Err(UploadError::UnexpectedResponse(other.kind())),
        }
    }

    /// Re-fetch a pair's images and descriptions for display.
    pub async fn load_gallery(&self, pair_id: &PairId) -> Result<Vec<GalleryItem>> {
        let (images, descriptions) = tokio::join!(
            self.bridge.invoke(Request::LoadImages {
                parent_id: pair_id.clone(),
            }),
            self.bridge.invoke(Request::LoadDescriptions {
                parent_id: pair_id.clone(),
            }),
        );

        let images = match images? {
            Response::Images { items } => items,
            other => return Err(UploadError::UnexpectedResponse(other.kind())),
        };
        let mut descriptions: HashMap<String, String> = match descriptions? {
            Response::Descriptions { items } => items
                .into_iter()
                .map(|item| (item.image_key, item.text))
                .collect(),
            other => return Err(UploadError::UnexpectedResponse(other.kind())),
        };

        images
            .into_iter()
            .map(|item| -> Result<GalleryItem> {
                Ok(GalleryItem {
                    description: descriptions.remove(item.id.as_str()),
                    handle: DisplayHandle::new(item.bytes)?,
                    image_id: item.id,
                })
            })
            .collect()
    }
}
