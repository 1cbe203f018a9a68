//! Local-disk image store, for development and single-node deployments

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::config::StorageConfig;
use crate::error::{AppError, Result};
use crate::storage::{key_from_reference, object_key, ImageStore};

pub struct LocalImageStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalImageStore {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let public_base_url = config
            .public_base_url
            .clone()
            .unwrap_or_else(|| "http://localhost:8080/media".to_string());

        Ok(Self {
            root: PathBuf::from(&config.local_dir),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Construct directly from a root directory (used by tests).
    pub fn with_root(root: impl AsRef<Path>, public_base_url: &str) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        _content_type: &str,
        original_name: &str,
    ) -> Result<String> {
        let key = object_key(original_name);
        let path = self.path_for(&key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Local store mkdir failed: {}", e)))?;
        }

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Storage(format!("Local store write failed: {}", e)))?;

        Ok(format!("{}/{}", self.public_base_url, key))
    }

    async fn delete(&self, reference: &str) -> Result<()> {
        let Some(key) = key_from_reference(reference) else {
            tracing::debug!(%reference, "no storage key derivable; skipping delete");
            return Ok(());
        };

        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            // Already gone counts as deleted
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("Local store delete failed: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> LocalImageStore {
        LocalImageStore::with_root(dir.path(), "http://localhost:8080/media")
    }

    #[tokio::test]
    async fn test_upload_writes_file_and_returns_reference() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        let reference = store
            .upload(b"fake png bytes".to_vec(), "image/png", "cat.png")
            .await
            .expect("upload succeeds");

        assert!(reference.starts_with("http://localhost:8080/media/uploads/"));
        assert!(reference.ends_with("cat.png"));

        let key = key_from_reference(&reference).unwrap();
        let written = std::fs::read(dir.path().join(key)).expect("file exists");
        assert_eq!(written, b"fake png bytes");
    }

    #[tokio::test]
    async fn test_delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        let reference = store
            .upload(b"bytes".to_vec(), "image/jpeg", "dog.jpg")
            .await
            .unwrap();
        let key = key_from_reference(&reference).unwrap().to_string();

        store.delete(&reference).await.expect("delete succeeds");
        assert!(!dir.path().join(&key).exists());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        let reference = store
            .upload(b"bytes".to_vec(), "image/png", "bird.png")
            .await
            .unwrap();

        store.delete(&reference).await.expect("first delete succeeds");
        store.delete(&reference).await.expect("second delete succeeds");
    }

    #[tokio::test]
    async fn test_delete_foreign_reference_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        store
            .delete("https://elsewhere.example/not-ours.png")
            .await
            .expect("foreign reference tolerated");
    }
}
