use crate::adapter::{check_key, BlobStorage};
use crate::error::{StorageError, StorageResult};
use annot_types::{BlobVariant, StorageId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

type BlobKey = (StorageId, BlobVariant, String);

/// In-process blob storage.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<BlobKey, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any blob of either variant exists for `storage_id`.
    pub fn contains_storage_id(&self, storage_id: &StorageId) -> bool {
        self.blobs
            .lock()
            .map(|b| b.keys().any(|(id, _, _)| id == storage_id))
            .unwrap_or(false)
    }

    fn read(&self, key: &BlobKey) -> StorageResult<Option<Vec<u8>>> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| StorageError::Backend("memory store lock poisoned".into()))?;
        Ok(blobs.get(key).cloned())
    }

    fn write(&self, key: BlobKey, data: Vec<u8>) -> StorageResult<()> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| StorageError::Backend("memory store lock poisoned".into()))?;
        blobs.insert(key, data);
        Ok(())
    }
}

#[async_trait]
impl BlobStorage for MemoryBlobStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(
        &self,
        storage_id: &StorageId,
        ext: &str,
        variant: BlobVariant,
    ) -> StorageResult<Vec<u8>> {
        check_key(storage_id, ext)?;
        self.read(&(storage_id.clone(), variant, ext.to_string()))?
            .ok_or_else(|| StorageError::not_found(storage_id, variant))
    }

    async fn put(
        &self,
        storage_id: &StorageId,
        ext: &str,
        variant: BlobVariant,
        data: &[u8],
    ) -> StorageResult<()> {
        check_key(storage_id, ext)?;
        self.write((storage_id.clone(), variant, ext.to_string()), data.to_vec())
    }
}
