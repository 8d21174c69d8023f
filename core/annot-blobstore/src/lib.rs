//! Blob storage for document payloads.
//!
//! Every document with a file owns up to two blobs, addressed by
//! `(storage id, variant, extension)`:
//! - `original`: the uploaded file
//! - `annotated`: the rendered output once the document is processed
//!
//! The archive engine only sees the [`BlobStorage`] trait. Backends:
//! - [`MemoryBlobStore`]: process-local map, used in tests and previews
//! - [`FsBlobStore`]: one directory per storage id
//! - [`DuckDbBlobStore`]: single database file with content hashes
//! - [`MirroredBlobStore`]: writes to two backends, reads with fallback

mod adapter;
mod duckdb_store;
mod error;
mod fs;
mod memory;
mod mirrored;

pub use adapter::{blob_file_name, BlobStorage};
pub use duckdb_store::DuckDbBlobStore;
pub use error::{StorageError, StorageResult};
pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;
pub use mirrored::MirroredBlobStore;
