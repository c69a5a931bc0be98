//! Filesystem-backed image bucket.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncWriteExt;

use super::{BlobEntry, BlobStore, IMAGE_BUCKET};
use crate::errors::AppError;

/// Image bucket stored as plain files under `<storage_dir>/artwork-images`.
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl LocalBlobStore {
    /// Open the bucket, creating its directory if needed.
    pub async fn open(storage_dir: &Path, public_base_url: Option<String>) -> Result<Self, AppError> {
        let root = storage_dir.join(IMAGE_BUCKET);
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| storage_error("create bucket directory", e))?;

        Ok(Self {
            root,
            public_base_url: public_base_url.map(|url| url.trim_end_matches('/').to_string()),
        })
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, AppError> {
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && !name.contains(['/', '\\'])
            && name != "..";
        if !valid {
            return Err(AppError::Storage(format!("Invalid object name: {:?}", name)));
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, name: &str, bytes: Bytes) -> Result<(), AppError> {
        let path = self.path_for(name)?;

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| storage_error("create object", e))?;

        let written = async {
            file.write_all(&bytes).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = written {
            tokio::fs::remove_file(&path).await.ok();
            return Err(storage_error("write object", e));
        }

        tracing::debug!(object = name, size = bytes.len(), "Stored image");
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<(), AppError> {
        let path = self.path_for(name)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| storage_error("remove object", e))
    }

    async fn list(&self) -> Result<Vec<BlobEntry>, AppError> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| storage_error("list bucket", e))?;

        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| storage_error("list bucket", e))?
        {
            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            entries.push(BlobEntry {
                name,
                size: metadata.len(),
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn public_url(&self, name: &str) -> Result<String, AppError> {
        let base = self.public_base_url.as_deref().ok_or_else(|| {
            AppError::Storage("FOLIO_PUBLIC_URL is not configured".to_string())
        })?;
        Ok(format!("{}/storage/{}/{}", base, IMAGE_BUCKET, name))
    }
}

fn storage_error(action: &str, err: std::io::Error) -> AppError {
    tracing::error!("Storage error ({}): {:?}", action, err);
    AppError::Storage(format!("Failed to {}: {}", action, err))
}
