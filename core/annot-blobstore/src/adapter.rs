//! The storage interface consumed by the archive engine.

use crate::error::{StorageError, StorageResult};
use annot_types::{BlobVariant, StorageId};
use async_trait::async_trait;

/// Durable byte storage addressed by storage id, variant and extension.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Short backend name for log lines.
    fn backend_name(&self) -> &'static str;

    /// Reads a blob. Missing blobs are [`StorageError::NotFound`].
    async fn get(
        &self,
        storage_id: &StorageId,
        ext: &str,
        variant: BlobVariant,
    ) -> StorageResult<Vec<u8>>;

    /// Writes a blob, replacing any previous content under the same key.
    async fn put(
        &self,
        storage_id: &StorageId,
        ext: &str,
        variant: BlobVariant,
        data: &[u8],
    ) -> StorageResult<()>;
}

/// File name a blob is kept under inside its storage-id scope,
/// e.g. `original.pdf`.
pub fn blob_file_name(variant: BlobVariant, ext: &str) -> String {
    format!("{}{}", variant.as_str(), ext)
}

/// Rejects keys that would escape a per-id directory.
pub(crate) fn check_key(storage_id: &StorageId, ext: &str) -> StorageResult<()> {
    if !storage_id.is_path_safe() {
        return Err(StorageError::InvalidKey(format!(
            "storage id {storage_id:?} is not a single path component"
        )));
    }
    if ext.contains('/') || ext.contains('\\') || ext.contains("..") {
        return Err(StorageError::InvalidKey(format!(
            "extension {ext:?} contains a path separator"
        )));
    }
    Ok(())
}
