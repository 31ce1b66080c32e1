//! Local filesystem storage provider.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::StreamExt;
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::debug;

use devhub_core::error::{AppError, ErrorKind};
use devhub_core::result::AppResult;
use devhub_core::traits::storage::{ByteStream, StorageProvider};

/// Local filesystem storage provider.
///
/// Every blob is a regular file directly under the root directory.
#[derive(Debug, Clone)]
pub struct LocalStorageProvider {
    /// Root directory for all stored blobs.
    root: PathBuf,
}

impl LocalStorageProvider {
    /// Create a new local storage provider rooted at the given path.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ServiceUnavailable,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// Resolve a blob name to a path within the root.
    ///
    /// Names are flat; separators and dot segments are rejected so no name
    /// can escape the root.
    fn resolve(&self, name: &str) -> AppResult<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(AppError::bad_request(format!("Invalid blob name: '{name}'")));
        }
        Ok(self.root.join(name))
    }
}

fn not_found_or(name: &str, action: &str, e: std::io::Error) -> AppError {
    if e.kind() == std::io::ErrorKind::NotFound {
        AppError::not_found(format!("Blob not found: {name}"))
    } else {
        AppError::with_source(
            ErrorKind::ServiceUnavailable,
            format!("Failed to {action} blob: {name}"),
            e,
        )
    }
}

#[async_trait]
impl StorageProvider for LocalStorageProvider {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }

    async fn read(&self, name: &str) -> AppResult<ByteStream> {
        let full_path = self.resolve(name)?;
        let file = fs::File::open(&full_path)
            .await
            .map_err(|e| not_found_or(name, "open", e))?;

        let stream = ReaderStream::new(file);
        Ok(Box::pin(stream.map(|r| r.map(Bytes::from))))
    }

    async fn read_bytes(&self, name: &str) -> AppResult<Bytes> {
        let full_path = self.resolve(name)?;
        let data = fs::read(&full_path)
            .await
            .map_err(|e| not_found_or(name, "read", e))?;
        Ok(Bytes::from(data))
    }

    async fn write(&self, name: &str, data: Bytes) -> AppResult<()> {
        let full_path = self.resolve(name)?;
        fs::write(&full_path, &data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ServiceUnavailable,
                format!("Failed to write blob: {name}"),
                e,
            )
        })?;

        debug!(name, bytes = data.len(), "Wrote blob");
        Ok(())
    }

    async fn delete(&self, name: &str) -> AppResult<()> {
        let full_path = self.resolve(name)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::ServiceUnavailable,
                format!("Failed to delete blob: {name}"),
                e,
            )),
        }
    }

    async fn exists(&self, name: &str) -> AppResult<bool> {
        let full_path = self.resolve(name)?;
        fs::try_exists(&full_path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ServiceUnavailable,
                format!("Failed to stat blob: {name}"),
                e,
            )
        })
    }

    async fn list(&self) -> AppResult<Vec<String>> {
        let mut names = Vec::new();
        let mut dir = fs::read_dir(&self.root).await.map_err(|e| {
            AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to list blobs", e)
        })?;

        while let Some(entry) = dir.next_entry().await.map_err(|e| {
            AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to read blob entry", e)
        })? {
            let file_type = entry.file_type().await.map_err(|e| {
                AppError::with_source(ErrorKind::ServiceUnavailable, "Failed to stat blob entry", e)
            })?;
            if file_type.is_file() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }

        names.sort();
        Ok(names)
    }
}
