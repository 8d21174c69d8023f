//! DuckDB-backed blob storage.
//!
//! One row per blob keyed by `(storage_id, variant, ext)`, with the
//! SHA-256 of the content recorded at write time and checked on read.

use crate::adapter::{check_key, BlobStorage};
use crate::error::{StorageError, StorageResult};
use annot_types::{BlobVariant, StorageId};
use async_trait::async_trait;
use duckdb::{params, Connection};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::warn;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS document_blobs (
    storage_id   VARCHAR NOT NULL,
    variant      VARCHAR NOT NULL,
    ext          VARCHAR NOT NULL,
    data         BLOB NOT NULL,
    size         BIGINT NOT NULL,
    content_hash VARCHAR NOT NULL,
    stored_at    BIGINT NOT NULL,
    PRIMARY KEY (storage_id, variant, ext)
);
";

/// Blob storage in a DuckDB table.
#[derive(Clone)]
pub struct DuckDbBlobStore {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDbBlobStore {
    /// Opens (or creates) a database file.
    ///
    /// If the open fails and a stale `.wal` file sits beside the database,
    /// it is removed and the open retried once.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = match Connection::open(path) {
            Ok(conn) => conn,
            Err(first_err) => {
                let wal_path = path.with_extension(
                    path.extension()
                        .map(|ext| format!("{}.wal", ext.to_string_lossy()))
                        .unwrap_or_else(|| "wal".to_string()),
                );
                if !wal_path.exists() {
                    return Err(first_err.into());
                }
                warn!(path = %wal_path.display(), "DuckDB open failed, removing stale WAL and retrying");
                std::fs::remove_file(&wal_path)?;
                Connection::open(path)?
            }
        };
        Self::open_with_conn(Arc::new(Mutex::new(conn)))
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        Self::open_with_conn(Arc::new(Mutex::new(Connection::open_in_memory()?)))
    }

    /// Wraps a shared connection, creating the blob table if needed.
    pub fn open_with_conn(conn: Arc<Mutex<Connection>>) -> StorageResult<Self> {
        {
            let c = conn
                .lock()
                .map_err(|_| StorageError::Backend("connection lock poisoned".into()))?;
            c.execute_batch(SCHEMA)?;
        }
        Ok(Self { conn })
    }

    /// Number of stored blobs.
    pub fn count(&self) -> StorageResult<u64> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM document_blobs", [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Backend("connection lock poisoned".into()))
    }

    fn read_blob(
        &self,
        storage_id: &StorageId,
        ext: &str,
        variant: BlobVariant,
    ) -> StorageResult<Vec<u8>> {
        let conn = self.lock()?;
        let row = conn.query_row(
            "SELECT data, content_hash FROM document_blobs
             WHERE storage_id = ? AND variant = ? AND ext = ?",
            params![storage_id.as_str(), variant.as_str(), ext],
            |row| Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, String>(1)?)),
        );

        let (data, expected_hash) = match row {
            Ok(found) => found,
            Err(duckdb::Error::QueryReturnedNoRows) => {
                return Err(StorageError::not_found(storage_id, variant));
            }
            Err(e) => return Err(e.into()),
        };

        let actual_hash = hex::encode(Sha256::digest(&data));
        if actual_hash != expected_hash {
            return Err(StorageError::Corrupt(format!(
                "{storage_id} ({variant}) hash mismatch"
            )));
        }
        Ok(data)
    }

    fn write_blob(
        &self,
        storage_id: &StorageId,
        ext: &str,
        variant: BlobVariant,
        data: &[u8],
    ) -> StorageResult<()> {
        let content_hash = hex::encode(Sha256::digest(data));
        let now = chrono::Utc::now().timestamp_millis();
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO document_blobs
             (storage_id, variant, ext, data, size, content_hash, stored_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                storage_id.as_str(),
                variant.as_str(),
                ext,
                data.to_vec(),
                data.len() as i64,
                content_hash,
                now
            ],
        )?;
        Ok(())
    }
}

#[async_trait]
impl BlobStorage for DuckDbBlobStore {
    fn backend_name(&self) -> &'static str {
        "duckdb"
    }

    async fn get(
        &self,
        storage_id: &StorageId,
        ext: &str,
        variant: BlobVariant,
    ) -> StorageResult<Vec<u8>> {
        check_key(storage_id, ext)?;
        self.read_blob(storage_id, ext, variant)
    }

    async fn put(
        &self,
        storage_id: &StorageId,
        ext: &str,
        variant: BlobVariant,
        data: &[u8],
    ) -> StorageResult<()> {
        check_key(storage_id, ext)?;
        self.write_blob(storage_id, ext, variant, data)
    }
}
