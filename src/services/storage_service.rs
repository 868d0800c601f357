use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

pub const FALLBACK_EXTENSION: &str = "mp3";

/// Where an uploaded audio payload ended up.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StoredObject {
    pub file_id: String,
    pub file_url: String,
    pub storage_path: String,
    pub file_size: u64,
    pub content_type: Option<String>,
    pub original_filename: String,
}

/// External object store holding the audio files.
///
/// `store` borrows the payload so callers can still read it afterwards.
/// `delete` reports whether the object is gone; a real backend maps transport
/// failures to `Err`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn store(
        &self,
        payload: &[u8],
        owner_id: &str,
        filename: &str,
        content_type: Option<&str>,
    ) -> Result<StoredObject>;

    async fn delete(&self, storage_path: &str) -> Result<bool>;
}

/// Computes locators like a CDN-backed bucket would, without any network I/O.
#[derive(Debug, Clone)]
pub struct SimulatedObjectStore {
    base_url: String,
}

impl SimulatedObjectStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn storage_path(owner_id: &str, file_id: &str, filename: &str) -> String {
        format!(
            "users/{}/audio/{}.{}",
            owner_id,
            file_id,
            file_extension(filename)
        )
    }

    pub fn file_url(&self, storage_path: &str) -> String {
        format!("{}/{}", self.base_url, storage_path)
    }
}

#[async_trait]
impl ObjectStore for SimulatedObjectStore {
    async fn store(
        &self,
        payload: &[u8],
        owner_id: &str,
        filename: &str,
        content_type: Option<&str>,
    ) -> Result<StoredObject> {
        if owner_id.is_empty() || owner_id.contains('/') {
            return Err(Error::StorageFail(format!(
                "owner id '{}' cannot be used as a path segment",
                owner_id
            )));
        }

        let file_id = Uuid::new_v4().to_string();
        let storage_path = Self::storage_path(owner_id, &file_id, filename);
        let file_url = self.file_url(&storage_path);

        tracing::debug!(
            storage_path = %storage_path,
            size = payload.len(),
            "stored audio object (simulated)"
        );

        Ok(StoredObject {
            file_id,
            file_url,
            storage_path,
            file_size: payload.len() as u64,
            content_type: content_type.map(str::to_string),
            original_filename: filename.to_string(),
        })
    }

    async fn delete(&self, storage_path: &str) -> Result<bool> {
        tracing::debug!(storage_path = %storage_path, "deleted audio object (simulated)");
        Ok(true)
    }
}

/// Text after the last dot, or `mp3` when there is none.
pub fn file_extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext,
        _ => FALLBACK_EXTENSION,
    }
}
