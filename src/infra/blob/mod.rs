//! Blob storage for oversized telemetry payloads.
//!
//! [`StorageConnection`] parses the storage connection string.
//! [`BlobStore`] is the async trait for uploading text and getting back an address.
//! [`S3BlobStore`] implements [`BlobStore`] on Amazon S3 (or any S3-compatible endpoint).
//! [`MemoryBlobStore`] keeps blobs in process, for local runs and tests.

mod connection;
mod memory;
mod s3;

pub use connection::StorageConnection;
pub use memory::MemoryBlobStore;
pub use s3::S3BlobStore;

use crate::error::Result;

/// Uploads plain text under `container/key` and returns the address it can
/// be read back from.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload_text(&self, container: &str, key: &str, text: &str) -> Result<String>;
}
