//! Bridge request and response variants
//!
//! Wire form is JSON with an `op` tag on requests and a `kind` tag on
//! responses; field names are camelCase for the UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use pairbook_records::{CurrencyPair, ImageDescription, ImageId, ImageRecord, PairId};

use crate::error::BridgeError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Request {
    SavePair {
        name: String,
    },
    SaveImage {
        parent_id: PairId,
        bytes: Vec<u8>,
    },
    LoadImages {
        parent_id: PairId,
    },
    SaveDescription {
        parent_id: PairId,
        image_key: String,
        text: String,
    },
    LoadDescriptions {
        parent_id: PairId,
    },
    LoadPairs,
    DeletePair {
        parent_id: PairId,
    },
}

impl Request {
    /// Parse and validate an untyped payload coming from the UI.
    pub fn from_value(value: Value) -> Result<Self, BridgeError> {
        let request: Request =
            serde_json::from_value(value).map_err(|e| BridgeError::InvalidRequest(e.to_string()))?;

        if let Request::SaveDescription { image_key, .. } = &request {
            if image_key.trim().is_empty() {
                return Err(BridgeError::InvalidRequest(
                    "imageKey cannot be empty".to_string(),
                ));
            }
        }

        Ok(request)
    }

    pub fn op(&self) -> &'static str {
        match self {
            Request::SavePair { .. } => "save-pair",
            Request::SaveImage { .. } => "save-image",
            Request::LoadImages { .. } => "load-images",
            Request::SaveDescription { .. } => "save-description",
            Request::LoadDescriptions { .. } => "load-descriptions",
            Request::LoadPairs => "load-pairs",
            Request::DeletePair { .. } => "delete-pair",
        }
    }

    /// Whether the request changes stored state.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Request::SavePair { .. }
                | Request::SaveImage { .. }
                | Request::SaveDescription { .. }
                | Request::DeletePair { .. }
        )
    }

    /// Answer used when the storage host cannot be reached.
    ///
    /// Saves report success without persisting, loads come back empty and a
    /// new pair still gets a usable id.
    pub fn placeholder(&self) -> Response {
        match self {
            Request::SavePair { .. } => Response::PairSaved { id: PairId::new() },
            Request::SaveImage { .. } => Response::ImageSaved { ok: true, id: None },
            Request::LoadImages { .. } => Response::Images { items: Vec::new() },
            Request::SaveDescription { .. } => Response::DescriptionSaved { ok: true },
            Request::LoadDescriptions { .. } => Response::Descriptions { items: Vec::new() },
            Request::LoadPairs => Response::Pairs { items: Vec::new() },
            Request::DeletePair { .. } => Response::PairDeleted { ok: false },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Response {
    PairSaved { id: PairId },
    ImageSaved { ok: bool, id: Option<ImageId> },
    Images { items: Vec<ImageItem> },
    DescriptionSaved { ok: bool },
    Descriptions { items: Vec<DescriptionItem> },
    Pairs { items: Vec<PairItem> },
    PairDeleted { ok: bool },
}

impl Response {
    pub fn kind(&self) -> &'static str {
        match self {
            Response::PairSaved { .. } => "pair-saved",
            Response::ImageSaved { .. } => "image-saved",
            Response::Images { .. } => "images",
            Response::DescriptionSaved { .. } => "description-saved",
            Response::Descriptions { .. } => "descriptions",
            Response::Pairs { .. } => "pairs",
            Response::PairDeleted { .. } => "pair-deleted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageItem {
    pub id: ImageId,
    pub bytes: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

impl From<ImageRecord> for ImageItem {
    fn from(image: ImageRecord) -> Self {
        Self {
            id: image.id,
            bytes: image.bytes,
            created_at: image.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionItem {
    pub image_key: String,
    pub text: String,
}

impl From<ImageDescription> for DescriptionItem {
    fn from(description: ImageDescription) -> Self {
        Self {
            image_key: description.image_key,
            text: description.text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairItem {
    pub id: PairId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<CurrencyPair> for PairItem {
    fn from(pair: CurrencyPair) -> Self {
        Self {
            id: pair.id,
            name: pair.name,
            created_at: pair.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_ui_payloads() {
        let request = Request::from_value(json!({
            "op": "save-description",
            "parentId": "p1",
            "imageKey": "img-1",
            "text": "chart 1"
        }))
        .unwrap();

        assert_eq!(
            request,
            Request::SaveDescription {
                parent_id: PairId::from("p1"),
                image_key: "img-1".to_string(),
                text: "chart 1".to_string(),
            }
        );

        let request = Request::from_value(json!({
            "op": "save-image",
            "parentId": "p1",
            "bytes": [137, 80, 78, 71]
        }))
        .unwrap();
        assert_eq!(request.op(), "save-image");

        let request = Request::from_value(json!({ "op": "load-pairs" })).unwrap();
        assert_eq!(request, Request::LoadPairs);
    }

    #[test]
    fn test_rejects_malformed_payloads() {
        for payload in [
            json!({ "op": "drop-tables" }),
            json!({ "op": "save-pair" }),
            json!({ "op": "save-image", "parentId": "p1", "bytes": [256] }),
            json!({ "op": "load-images", "parentId": 42 }),
            json!({ "op": "save-description", "parentId": "p1", "imageKey": " ", "text": "x" }),
            json!("save-pair"),
        ] {
            assert!(
                matches!(
                    Request::from_value(payload.clone()),
                    Err(BridgeError::InvalidRequest(_))
                ),
                "accepted {payload}"
            );
        }
    }

    #[test]
    fn test_response_wire_shape() {
        let response = Response::ImageSaved {
            ok: true,
            id: Some(ImageId::from("img-1")),
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "kind": "image-saved", "ok": true, "id": "img-1" })
        );

        let response = Response::Descriptions {
            items: vec![DescriptionItem {
                image_key: "img-1".to_string(),
                text: "chart".to_string(),
            }],
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "kind": "descriptions", "items": [{ "imageKey": "img-1", "text": "chart" }] })
        );
    }

    #[test]
    fn test_placeholders() {
        let parent_id = PairId::from("p1");

        assert!(matches!(
            Request::SavePair { name: "BTC/USD".to_string() }.placeholder(),
            Response::PairSaved { .. }
        ));
        assert_eq!(
            Request::LoadImages { parent_id: parent_id.clone() }.placeholder(),
            Response::Images { items: Vec::new() }
        );
        assert_eq!(
            Request::DeletePair { parent_id }.placeholder(),
            Response::PairDeleted { ok: false }
        );
    }

    #[test]
    fn test_writes_are_told_apart_from_reads() {
        let parent_id = PairId::from("p1");

        assert!(Request::SaveImage {
            parent_id: parent_id.clone(),
            bytes: vec![1],
        }
        .is_write());
        assert!(Request::DeletePair {
            parent_id: parent_id.clone(),
        }
        .is_write());
        assert!(!Request::LoadPairs.is_write());
        assert!(!Request::LoadDescriptions { parent_id }.is_write());
    }
}
