use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::BlobStore;
use crate::error::Result;

/// Keeps blobs in process memory under `memory://{container}/{key}`.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the text stored at `address`.
    pub fn get(&self, address: &str) -> Option<String> {
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload_text(&self, container: &str, key: &str, text: &str) -> Result<String> {
        let address = format!("memory://{container}/{key}");
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(address.clone(), text.to_string());
        Ok(address)
    }
}
