use std::path::PathBuf;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{primitives::ByteStream, Client as S3Client};

use crate::{
    config::AwsConfig,
    error::{AppError, Result},
};

const VALID_IMAGE_EXTS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

pub fn is_valid_image_ext(ext: &str) -> bool {
    VALID_IMAGE_EXTS.contains(&ext.to_ascii_lowercase().as_str())
}

/// Storage backend for uploaded files. Implementations are selected by
/// configuration at startup and held behind `Arc<dyn UploadProvider>`.
#[async_trait]
pub trait UploadProvider: Send + Sync {
    async fn upload_file(&self, content: &[u8], content_type: &str, path: &str) -> Result<String>;
    async fn delete_file(&self, path: &str) -> Result<()>;
}

pub struct LocalUploadProvider {
    base_path: PathBuf,
}

impl LocalUploadProvider {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }
}

#[async_trait]
impl UploadProvider for LocalUploadProvider {
    async fn upload_file(&self, content: &[u8], _content_type: &str, path: &str) -> Result<String> {
        let full_path = self.full_path(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::InternalError(format!("Failed to create dir: {}", e)))?;
        }

        tokio::fs::write(&full_path, content)
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to write file: {}", e)))?;

        Ok(format!("/uploads/{}", path))
    }

    async fn delete_file(&self, path: &str) -> Result<()> {
        tokio::fs::remove_file(self.full_path(path))
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to remove file: {}", e)))
    }
}

pub struct S3UploadProvider {
    client: S3Client,
    bucket: String,
}

impl S3UploadProvider {
    pub async fn new(config: &AwsConfig) -> Result<Self> {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let client = S3Client::new(&aws_config);

        tracing::info!("AWS S3 client initialized for bucket {}", config.s3_bucket);

        Ok(Self {
            client,
            bucket: config.s3_bucket.clone(),
        })
    }
}

#[async_trait]
impl UploadProvider for S3UploadProvider {
    async fn upload_file(&self, content: &[u8], content_type: &str, path: &str) -> Result<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .content_type(content_type)
            .body(ByteStream::from(content.to_vec()))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("S3 upload failed: {:?}", e);
                AppError::InternalError("Failed to upload file".to_string())
            })?;

        Ok(format!("/{}", path))
    }

    async fn delete_file(&self, path: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(path.trim_start_matches('/'))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("S3 delete failed: {:?}", e);
                AppError::InternalError("Failed to delete file".to_string())
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_extension_whitelist() {
        assert!(is_valid_image_ext("jpg"));
        assert!(is_valid_image_ext("WEBP"));
        assert!(!is_valid_image_ext("svg"));
        assert!(!is_valid_image_ext("exe"));
    }

    #[tokio::test]
    async fn local_provider_writes_and_deletes() {
        let dir = std::env::temp_dir().join(format!("vela-uploads-{}", uuid::Uuid::new_v4()));
        let provider = LocalUploadProvider::new(&dir);

        let url = provider
            .upload_file(b"fake-image-bytes", "image/png", "products/1/test.png")
            .await
            .expect("upload");
        assert_eq!(url, "/uploads/products/1/test.png");

        let on_disk = dir.join("products/1/test.png");
        assert_eq!(tokio::fs::read(&on_disk).await.expect("read"), b"fake-image-bytes");

        provider.delete_file("products/1/test.png").await.expect("delete");
        assert!(!on_disk.exists());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
