//! S3-backed image store

use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::config::StorageConfig;
use crate::error::{AppError, Result};
use crate::storage::{key_from_reference, object_key, ImageStore};

pub struct S3ImageStore {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3ImageStore {
    /// Build an S3 client from the provided configuration.
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let (Some(key_id), Some(secret)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                key_id,
                secret,
                None,
                None,
                "content-api",
            ));
        }

        let shared_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        let public_base_url = config.public_base_url.clone().unwrap_or_else(|| {
            format!(
                "https://{}.s3.{}.amazonaws.com",
                config.bucket, config.region
            )
        });

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
        original_name: &str,
    ) -> Result<String> {
        let key = object_key(original_name);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload failed: {}", e)))?;

        Ok(format!("{}/{}", self.public_base_url, key))
    }

    async fn delete(&self, reference: &str) -> Result<()> {
        let Some(key) = key_from_reference(reference) else {
            // Nothing of ours to delete behind this reference
            tracing::debug!(%reference, "no storage key derivable; skipping delete");
            return Ok(());
        };

        // DeleteObject succeeds for absent keys, which gives us idempotence
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 delete failed: {}", e)))?;

        Ok(())
    }
}
