//! Object store trait for pluggable blob storage backends.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::result::AppResult;

/// A byte stream type used for reading blob contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Trait for blob storage backends.
///
/// Blobs live in a flat namespace of opaque names. The [`StorageProvider`]
/// trait is defined here in `devhub-core` and implemented in `devhub-storage`.
#[async_trait]
pub trait StorageProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local").
    fn provider_type(&self) -> &str;

    /// Check whether the provider is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Read a blob as a byte stream.
    async fn read(&self, name: &str) -> AppResult<ByteStream>;

    /// Read a blob into memory.
    async fn read_bytes(&self, name: &str) -> AppResult<Bytes>;

    /// Write a blob, replacing any previous content under the same name.
    async fn write(&self, name: &str, data: Bytes) -> AppResult<()>;

    /// Delete a blob. Deleting a missing blob is not an error.
    async fn delete(&self, name: &str) -> AppResult<()>;

    /// Check whether a blob exists.
    async fn exists(&self, name: &str) -> AppResult<bool>;

    /// List every blob name in the store.
    async fn list(&self) -> AppResult<Vec<String>>;
}
