//! Blob store trait for generated assets and uploaded source images.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Trait for URL-addressable blob storage.
///
/// Paths are namespaced `{user}/{job}/...` by callers so concurrent jobs
/// never collide. The trait is defined here in `wbgen-core` and implemented
/// in `wbgen-storage`.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local").
    fn provider_type(&self) -> &str;

    /// Write bytes at the given path and return the public URL.
    async fn put(&self, path: &str, data: Bytes) -> AppResult<String>;

    /// Read the bytes stored at the given path.
    async fn get(&self, path: &str) -> AppResult<Bytes>;

    /// Check whether an object exists at the given path.
    async fn exists(&self, path: &str) -> AppResult<bool>;

    /// Delete the object at the given path. Missing objects are not an error.
    async fn delete(&self, path: &str) -> AppResult<()>;

    /// Return the public URL for a stored path without touching the object.
    fn public_url(&self, path: &str) -> String;
}
