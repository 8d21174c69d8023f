//! Core type definitions for the annotation archive engine.
//!
//! This crate defines the records that travel through export and import:
//! - Project, document and storage identifiers
//! - [`Project`] and [`Document`] snapshots
//! - Project/document configuration ([`Label`], [`Rule`])
//! - Blob variants and file-name helpers shared by the archive layers
//!
//! Nothing here touches storage or encryption.

mod config;
mod document;
mod ids;
mod naming;
mod project;

pub use config::{merge_unique, Label, Rule};
pub use document::{BlobVariant, Document, DocumentStatus};
pub use ids::{DocumentId, ProjectId, StorageId};
pub use naming::{file_extension, split_extension};
pub use project::Project;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid storage identifier: {0:?}")]
    InvalidStorageId(String),

    #[error("unknown document status: {0}")]
    UnknownStatus(String),
}
