//! Storage host
//!
//! Owns the record store and serves bridge requests from a channel. Each
//! request is handled on its own task so slow uploads never hold up reads.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use pairbook_records::RecordStore;

use crate::bridge::StorageBridge;
use crate::request::{Request, Response};
use crate::Result;

const CHANNEL_CAPACITY: usize = 64;

pub(crate) struct Envelope {
    pub request: Request,
    pub reply: oneshot::Sender<Result<Response>>,
}

pub struct StorageHost {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl StorageHost {
    /// Start serving `store` and hand back a bridge connected to it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(store: Arc<dyn RecordStore>) -> (Self, StorageBridge) {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(serve(store, receiver, shutdown_rx));

        tracing::info!("Storage host started");

        let host = Self {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        };
        (host, StorageBridge::connected(sender))
    }

    /// Stop accepting requests. Bridges still holding a sender fall back to
    /// placeholders from here on.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Storage host task failed");
            }
        }
        tracing::info!("Storage host stopped");
    }
}

async fn serve(
    store: Arc<dyn RecordStore>,
    mut receiver: mpsc::Receiver<Envelope>,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            envelope = receiver.recv() => {
                let Some(Envelope { request, reply }) = envelope else {
                    break;
                };
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let op = request.op();
                    let result = dispatch(store.as_ref(), request).await;
                    if let Err(e) = &result {
                        tracing::error!(op, error = %e, "Storage request failed");
                    }
                    // Caller may have timed out and gone away
                    let _ = reply.send(result);
                });
            }
        }
    }
}

/// Map one request onto the matching store operation.
pub(crate) async fn dispatch(store: &dyn RecordStore, request: Request) -> Result<Response> {
    tracing::debug!(op = request.op(), "Dispatching storage request");

    let response = match request {
        Request::SavePair { name } => Response::PairSaved {
            id: store.create_pair(&name).await?,
        },
        Request::SaveImage { parent_id, bytes } => {
            let id = store.create_image(&parent_id, bytes).await?;
            Response::ImageSaved {
                ok: true,
                id: Some(id),
            }
        }
        Request::LoadImages { parent_id } => Response::Images {
            items: store
                .list_images(&parent_id)
                .await?
                .into_iter()
                .map(Into::into)
                .collect(),
        },
        Request::SaveDescription {
            parent_id,
            image_key,
            text,
        } => {
            store
                .upsert_description(&parent_id, &image_key, &text)
                .await?;
            Response::DescriptionSaved { ok: true }
        }
        Request::LoadDescriptions { parent_id } => Response::Descriptions {
            items: store
                .list_descriptions(&parent_id)
                .await?
                .into_iter()
                .map(Into::into)
                .collect(),
        },
        Request::LoadPairs => Response::Pairs {
            items: store
                .list_pairs()
                .await?
                .into_iter()
                .map(Into::into)
                .collect(),
        },
        Request::DeletePair { parent_id } => Response::PairDeleted {
            ok: store.delete_pair(&parent_id).await?,
        },
    };

    Ok(response)
}
