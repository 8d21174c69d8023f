//! Dual-backend storage.
//!
//! Restored blobs are written to two independent backends so either one
//! can serve them. Callers see a single [`BlobStorage`].

use crate::adapter::BlobStorage;
use crate::error::StorageResult;
use annot_types::{BlobVariant, StorageId};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Writes to both backends, reads from the primary with secondary fallback.
#[derive(Clone)]
pub struct MirroredBlobStore {
    primary: Arc<dyn BlobStorage>,
    secondary: Arc<dyn BlobStorage>,
}

impl MirroredBlobStore {
    pub fn new(primary: Arc<dyn BlobStorage>, secondary: Arc<dyn BlobStorage>) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl BlobStorage for MirroredBlobStore {
    fn backend_name(&self) -> &'static str {
        "mirrored"
    }

    async fn get(
        &self,
        storage_id: &StorageId,
        ext: &str,
        variant: BlobVariant,
    ) -> StorageResult<Vec<u8>> {
        let primary_err = match self.primary.get(storage_id, ext, variant).await {
            Ok(bytes) => return Ok(bytes),
            Err(e) => e,
        };

        if !primary_err.is_not_found() {
            warn!(
                storage_id = %storage_id,
                backend = self.primary.backend_name(),
                error = %primary_err,
                "Primary blob read failed, trying secondary"
            );
        }

        match self.secondary.get(storage_id, ext, variant).await {
            Ok(bytes) => {
                debug!(storage_id = %storage_id, %variant, "Blob served from secondary backend");
                Ok(bytes)
            }
            // A secondary miss reports the primary's error.
            Err(secondary_err) if secondary_err.is_not_found() => Err(primary_err),
            Err(secondary_err) => Err(secondary_err),
        }
    }

    async fn put(
        &self,
        storage_id: &StorageId,
        ext: &str,
        variant: BlobVariant,
        data: &[u8],
    ) -> StorageResult<()> {
        let primary = self.primary.put(storage_id, ext, variant, data).await;
        let secondary = self.secondary.put(storage_id, ext, variant, data).await;

        match (primary, secondary) {
            (Ok(()), Ok(())) => Ok(()),
            (Ok(()), Err(e)) => {
                warn!(
                    storage_id = %storage_id,
                    backend = self.secondary.backend_name(),
                    error = %e,
                    "Secondary blob write failed"
                );
                Ok(())
            }
            (Err(e), Ok(())) => {
                warn!(
                    storage_id = %storage_id,
                    backend = self.primary.backend_name(),
                    error = %e,
                    "Primary blob write failed"
                );
                Ok(())
            }
            (Err(e), Err(_)) => Err(e),
        }
    }
}
