//! Product image storage.
//!
//! Images are stored as uploaded. A stored image is addressed by an opaque
//! `image_ref` (`products/<uuid>-<sanitized name>`) that the product record
//! keeps; `url` turns a ref into something a client can fetch.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub const ACCEPTED_IMAGE_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/jpg", "image/webp"];
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const REF_PREFIX: &str = "products/";
const FILE_NAME_MAX: usize = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlobError {
    #[error("only PNG, JPG, JPEG and WebP images are supported (got {0})")]
    UnsupportedType(String),

    #[error("image is too large ({size} bytes, max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("invalid image reference: {0}")]
    InvalidRef(String),

    #[error("image storage error: {0}")]
    Io(String),
}

impl BlobError {
    /// Rejections caused by the upload itself rather than the storage backend.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnsupportedType(_) | Self::TooLarge { .. })
    }
}

/// An uploaded image as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn validate(&self) -> Result<(), BlobError> {
        let content_type = self.content_type.trim().to_ascii_lowercase();
        if !ACCEPTED_IMAGE_TYPES.contains(&content_type.as_str()) {
            return Err(BlobError::UnsupportedType(self.content_type.clone()));
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(BlobError::TooLarge {
                size: self.bytes.len(),
                max: MAX_IMAGE_BYTES,
            });
        }
        Ok(())
    }
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Validate and store; returns the new image ref.
    async fn put(&self, upload: &ImageUpload) -> Result<String, BlobError>;

    /// Release a stored image. Releasing an absent image is not an error.
    async fn delete(&self, image_ref: &str) -> Result<(), BlobError>;

    fn url(&self, image_ref: &str) -> String;
}

fn new_ref(file_name: &str) -> String {
    format!("{REF_PREFIX}{}-{}", Uuid::new_v4().simple(), sanitize_file_name(file_name))
}

fn sanitize_file_name(file_name: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(FILE_NAME_MAX)
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}

fn check_ref(image_ref: &str) -> Result<(), BlobError> {
    let path = Path::new(image_ref);
    let well_formed = image_ref.starts_with(REF_PREFIX)
        && path.components().all(|c| matches!(c, Component::Normal(_)));
    if well_formed {
        Ok(())
    } else {
        Err(BlobError::InvalidRef(image_ref.to_string()))
    }
}

fn join_url(base_url: &str, image_ref: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), image_ref)
}

/// Stores images under a media root on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    base_url: String,
    span: tracing::Span,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>, span: tracing::Span) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
            span,
        }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, upload: &ImageUpload) -> Result<String, BlobError> {
        upload.validate()?;

        let image_ref = new_ref(&upload.file_name);
        let path = self.root.join(&image_ref);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| BlobError::Io(format!("create {}: {e}", dir.display())))?;
        }
        tokio::fs::write(&path, &upload.bytes)
            .await
            .map_err(|e| BlobError::Io(format!("write {}: {e}", path.display())))?;

        tracing::info!(parent: &self.span, %image_ref, size = upload.bytes.len(), "image stored");
        Ok(image_ref)
    }

    async fn delete(&self, image_ref: &str) -> Result<(), BlobError> {
        check_ref(image_ref)?;
        let path = self.root.join(image_ref);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(parent: &self.span, %image_ref, "image released");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(parent: &self.span, %image_ref, "image already absent");
                Ok(())
            }
            Err(e) => Err(BlobError::Io(format!("remove {}: {e}", path.display()))),
        }
    }

    fn url(&self, image_ref: &str) -> String {
        join_url(&self.base_url, image_ref)
    }
}

/// Keeps images in memory. Deletes can be made to fail on demand.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, ImageUpload>>,
    fail_deletes: AtomicBool,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, image_ref: &str) -> bool {
        self.blobs
            .read()
            .map(|b| b.contains_key(image_ref))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, upload: &ImageUpload) -> Result<String, BlobError> {
        upload.validate()?;
        let image_ref = new_ref(&upload.file_name);
        self.blobs
            .write()
            .map_err(|_| BlobError::Io("blob map lock poisoned".into()))?
            .insert(image_ref.clone(), upload.clone());
        Ok(image_ref)
    }

    async fn delete(&self, image_ref: &str) -> Result<(), BlobError> {
        check_ref(image_ref)?;
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(BlobError::Io(format!("refusing to delete {image_ref}")));
        }
        self.blobs
            .write()
            .map_err(|_| BlobError::Io("blob map lock poisoned".into()))?
            .remove(image_ref);
        Ok(())
    }

    fn url(&self, image_ref: &str) -> String {
        join_url("/media", image_ref)
    }
}
