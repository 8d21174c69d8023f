//! Project and document archives.
//!
//! An archive is a ZIP container of JSON metadata plus document blobs,
//! optionally wrapped in a password envelope:
//!
//! - `.annproj`: `project.json`, `documents.json`,
//!   `files/<storageId>_original<ext>`, `files/<storageId>_annotated<ext>`
//! - `.anndoc`: `document.json`, `labels.json`, `rules.json`,
//!   `original<ext>`, `annotated<ext>`
//! - `.annlabels`: `labels.json`
//! - `.annrules`: `rules.json`
//!
//! Export ([`ArchiveBuilder`]) reads snapshots and blob storage and returns
//! finished bytes. Import ([`ArchiveImporter`]) validates an archive, then
//! re-materializes its contents as brand-new records: fresh ids from an
//! [`IdAllocator`], collision-free names from [`dedup_name`], and fresh
//! storage ids for every restored blob. Missing blobs are logged and
//! reported, never fatal.

mod allocator;
mod builder;
mod codec;
mod config;
mod dedup;
mod error;
mod importer;
mod layout;
mod sink;

pub use allocator::{IdAllocator, SequentialAllocator};
pub use builder::{ArchiveBuilder, ExportReport, ExportedArchive};
pub use codec::{build_container, is_container, Container, ContainerBuilder, ZIP_MAGIC};
pub use config::{ArchiveConfig, KdfSettings};
pub use dedup::{dedup_name, NameScope};
pub use error::{ArchiveError, ArchiveResult};
pub use importer::{
    ArchiveImporter, ArchiveSummary, ImportReport, ImportScope, ImportedDocument, ImportedProject,
};
pub use layout::{
    document_blob_path, project_blob_path, unseal, ArchiveKind, DOCUMENTS_ENTRY, DOCUMENT_ENTRY,
    FILES_DIR, LABELS_ENTRY, PROJECT_ENTRY, RULES_ENTRY,
};
pub use sink::{save_archive, CancelledSink, DestinationSink, FileFilter, FixedPathSink};
