//! Selected document payload.

use anyhow::{Context, Result};
use bytes::Bytes;
use std::path::Path;

/// In-memory handle to the document a user picked for scanning.
///
/// Cloning is cheap; the payload is reference counted.
#[derive(Debug, Clone)]
pub struct FileRef {
    name: String,
    content_type: String,
    payload: Bytes,
}

impl FileRef {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            payload: payload.into(),
        }
    }

    /// Read a document from disk, guessing its content type from the extension.
    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    pub async fn open(path: &Path) -> Result<Self> {
        let payload = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read document {}", path.display()))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("Path has no file name: {}", path.display()))?;

        let content_type = content_type_for(&name);
        tracing::debug!(size = payload.len(), content_type, "Loaded document");

        Ok(Self::new(name, content_type, payload))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size(&self) -> u64 {
        self.payload.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }
}

/// MIME type for the document formats the scanning service understands.
pub fn content_type_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "tif" | "tiff" => "image/tiff",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
