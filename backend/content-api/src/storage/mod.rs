//! Image object storage
//!
//! One `ImageStore` seam with two backends: S3 object storage and local disk,
//! selected by configuration. Uploads land under collision-resistant keys and
//! return a dereferenceable public URL; deletes are idempotent.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::Result;

pub mod local;
pub mod s3;

pub use local::LocalImageStore;
pub use s3::S3ImageStore;

/// Prefix namespacing every uploaded object
pub const UPLOAD_PREFIX: &str = "uploads";

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Write the payload under a fresh key and return its public URL.
    async fn upload(&self, bytes: Vec<u8>, content_type: &str, original_name: &str)
        -> Result<String>;

    /// Remove the object behind a public URL. Idempotent: deleting an
    /// already-absent object succeeds.
    async fn delete(&self, reference: &str) -> Result<()>;
}

/// Build the configured store implementation.
pub async fn build_store(config: &StorageConfig) -> Result<Arc<dyn ImageStore>> {
    match config.backend {
        StorageBackend::S3 => Ok(Arc::new(S3ImageStore::new(config).await?)),
        StorageBackend::Local => Ok(Arc::new(LocalImageStore::new(config)?)),
    }
}

/// Collision-resistant object key: millisecond timestamp plus a random
/// component plus the sanitized original name, under the upload prefix.
pub(crate) fn object_key(original_name: &str) -> String {
    format!(
        "{}/{}-{}-{}",
        UPLOAD_PREFIX,
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        sanitize_name(original_name)
    )
}

/// Derive the storage key from a public URL by locating the upload prefix.
pub(crate) fn key_from_reference(reference: &str) -> Option<&str> {
    let marker = format!("{}/", UPLOAD_PREFIX);
    reference.find(&marker).map(|idx| &reference[idx..])
}

fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_keys_are_unique() {
        let a = object_key("photo.png");
        let b = object_key("photo.png");
        assert_ne!(a, b);
        assert!(a.starts_with("uploads/"));
        assert!(a.ends_with("photo.png"));
    }

    #[test]
    fn test_sanitize_strips_path_separators() {
        let key = object_key("../etc/passwd");
        assert!(!key[UPLOAD_PREFIX.len() + 1..].contains('/'));
    }

    #[test]
    fn test_key_from_reference() {
        let key = object_key("cat.jpg");
        let url = format!("https://bucket.s3.us-east-1.amazonaws.com/{}", key);
        assert_eq!(key_from_reference(&url), Some(key.as_str()));
        assert_eq!(key_from_reference("https://elsewhere.example/img.png"), None);
    }
}
