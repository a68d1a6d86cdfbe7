use actix_multipart::form::{tempfile::TempFile, MultipartForm};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Top-level prefix of every listing image in the object store.
pub const IMAGE_PREFIX: &str = "images";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Jpeg,
    Png,
}

impl MediaType {
    /// Parses a MIME string, ignoring parameters such as `; charset=...`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "image/jpeg" => Some(MediaType::Jpeg),
            "image/png" => Some(MediaType::Png),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
        }
    }
}

/// Path of an image object: `images/{uid}/{name}`.
pub fn object_path(uid: &Uuid, name: &str) -> String {
    format!("{}/{}/{}", IMAGE_PREFIX, uid, name)
}

/// Reference to a stored image, as persisted with a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    pub uid: Uuid,
    pub name: String,
    pub url: String,
}

impl ImageReference {
    pub fn object_path(&self) -> String {
        object_path(&self.uid, &self.name)
    }
}

/// An image staged in a draft. Only `reference` survives submission.
#[derive(Debug, Clone, Serialize)]
pub struct PendingImage {
    #[serde(flatten)]
    pub reference: ImageReference,
    pub file_name: Option<String>,
    pub media_type: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// An uploaded file before it reaches the object store.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: Option<String>,
    pub declared_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(file_name: Option<String>, declared_type: Option<String>, bytes: Vec<u8>) -> Self {
        ImageFile {
            file_name,
            declared_type,
            bytes,
        }
    }

    /// The declared type decides; bytes are sniffed only when nothing was declared.
    pub fn media_type(&self) -> Result<MediaType, AppError> {
        let mime = match self.declared_type.as_deref().map(str::trim) {
            Some(declared) if !declared.is_empty() => declared.to_string(),
            _ => infer::get(&self.bytes)
                .map(|kind| kind.mime_type().to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string()),
        };

        MediaType::from_mime(&mime).ok_or(AppError::UnsupportedMediaType(mime))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Result of deleting a batch of image objects. Images whose deletion
/// failed are still in the object store with nothing referencing them.
#[derive(Debug, Default, Serialize)]
pub struct CleanupReport {
    pub removed_images: usize,
    pub orphaned_images: Vec<ImageReference>,
}

impl CleanupReport {
    pub fn merge(&mut self, other: CleanupReport) {
        self.removed_images += other.removed_images;
        self.orphaned_images.extend(other.orphaned_images);
    }
}

/// Per-upload and per-draft caps.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_image_bytes: u64,
    pub max_draft_images: usize,
}

#[derive(Debug, MultipartForm)]
pub struct ImageUpload {
    #[multipart(rename = "image", limit = "10MB")]
    pub image: TempFile,
}
