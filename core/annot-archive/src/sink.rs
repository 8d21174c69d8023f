//! Handing finished archives to a destination.

use crate::builder::ExportedArchive;
use crate::error::ArchiveResult;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

/// File-type filter offered to the user when choosing a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileFilter {
    pub description: &'static str,
    pub extension: &'static str,
}

/// Where finished archive bytes go.
///
/// A desktop shell implements this with a save dialog; `None` from
/// [`choose_path`](DestinationSink::choose_path) means the user cancelled.
#[async_trait]
pub trait DestinationSink: Send {
    async fn choose_path(&mut self, suggested_name: &str, filter: FileFilter) -> Option<PathBuf>;

    async fn write_bytes(&mut self, path: &Path, bytes: &[u8]) -> ArchiveResult<()>;
}

/// Writes to a preset location. A directory target receives the archive
/// under its suggested file name.
#[derive(Debug, Clone)]
pub struct FixedPathSink {
    target: PathBuf,
}

impl FixedPathSink {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

#[async_trait]
impl DestinationSink for FixedPathSink {
    async fn choose_path(&mut self, suggested_name: &str, _filter: FileFilter) -> Option<PathBuf> {
        if tokio::fs::metadata(&self.target)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            Some(self.target.join(suggested_name))
        } else {
            Some(self.target.clone())
        }
    }

    async fn write_bytes(&mut self, path: &Path, bytes: &[u8]) -> ArchiveResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }
}

/// A sink whose user always cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct CancelledSink;

#[async_trait]
impl DestinationSink for CancelledSink {
    async fn choose_path(&mut self, _suggested_name: &str, _filter: FileFilter) -> Option<PathBuf> {
        None
    }

    async fn write_bytes(&mut self, _path: &Path, _bytes: &[u8]) -> ArchiveResult<()> {
        Ok(())
    }
}

/// Asks the sink for a destination and writes the archive there.
///
/// Returns `Ok(None)` without writing anything when the user cancels.
pub async fn save_archive(
    archive: &ExportedArchive,
    sink: &mut dyn DestinationSink,
) -> ArchiveResult<Option<PathBuf>> {
    let filter = FileFilter {
        description: archive.kind.description(),
        extension: archive.kind.extension(),
    };
    let Some(path) = sink.choose_path(&archive.suggested_file_name, filter).await else {
        info!(kind = %archive.kind, "Archive save cancelled");
        return Ok(None);
    };

    sink.write_bytes(&path, &archive.bytes).await?;
    info!(
        kind = %archive.kind,
        path = %path.display(),
        size_bytes = archive.bytes.len(),
        sealed = archive.sealed,
        "Archive saved"
    );
    Ok(Some(path))
}
