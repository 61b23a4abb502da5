//! Session-local display handles

use std::fmt;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

use crate::Result;

const SCHEME: &str = "pairbook-display";

/// Reference the UI renders an image through.
///
/// Handles are minted per session and never persisted; the durable
/// identity of an image is its `ImageId`.
#[derive(Clone)]
pub struct DisplayHandle {
    url: Url,
    mime_type: &'static str,
    bytes: Arc<[u8]>,
}

impl DisplayHandle {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Result<Self> {
        let bytes = bytes.into();
        let url = Url::parse(&format!("{SCHEME}:{}", Uuid::new_v4()))?;

        Ok(Self {
            url,
            mime_type: sniff_mime(&bytes),
            bytes,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for DisplayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayHandle")
            .field("url", &self.url.as_str())
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Guess an image MIME type from its leading magic bytes.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"BM", "image/bmp"),
    ];

    if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return "image/webp";
    }

    SIGNATURES
        .iter()
        .find(|(magic, _)| bytes.starts_with(magic))
        .map(|(_, mime)| *mime)
        .unwrap_or("application/octet-stream")
}
