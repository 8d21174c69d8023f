//! Local workspace and archive commands for the `annot` binary.

mod workspace;

pub use workspace::{
    Catalog, LocalWorkspace, MergedDocument, BLOB_DB_FILE, BLOB_DIR, CATALOG_FILE,
};
