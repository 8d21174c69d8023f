use crate::adapter::{blob_file_name, check_key, BlobStorage};
use crate::error::{StorageError, StorageResult};
use annot_types::{BlobVariant, StorageId};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Blob storage laid out as `root/<storage id>/<variant><ext>`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, storage_id: &StorageId, ext: &str, variant: BlobVariant) -> PathBuf {
        self.root
            .join(storage_id.as_str())
            .join(blob_file_name(variant, ext))
    }
}

#[async_trait]
impl BlobStorage for FsBlobStore {
    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    async fn get(
        &self,
        storage_id: &StorageId,
        ext: &str,
        variant: BlobVariant,
    ) -> StorageResult<Vec<u8>> {
        check_key(storage_id, ext)?;
        let path = self.blob_path(storage_id, ext, variant);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::not_found(storage_id, variant))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn put(
        &self,
        storage_id: &StorageId,
        ext: &str,
        variant: BlobVariant,
        data: &[u8],
    ) -> StorageResult<()> {
        check_key(storage_id, ext)?;
        let path = self.blob_path(storage_id, ext, variant);
        let dir = self.root.join(storage_id.as_str());
        tokio::fs::create_dir_all(&dir).await?;

        // Write beside the target, then rename.
        let tmp = dir.join(format!(".{}.tmp", blob_file_name(variant, ext)));
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(path = %path.display(), size_bytes = data.len(), "Blob written");
        Ok(())
    }
}
