//! Archive export.
//!
//! Metadata is serialized first, then each document's blobs are fetched one
//! at a time in document order. A blob that cannot be read is logged and
//! listed in the [`ExportReport`]; only metadata serialization, container
//! assembly and sealing can fail an export.

use crate::codec::ContainerBuilder;
use crate::config::ArchiveConfig;
use crate::error::{ArchiveError, ArchiveResult};
use crate::layout::{
    document_blob_path, project_blob_path, ArchiveKind, DOCUMENTS_ENTRY, DOCUMENT_ENTRY,
    LABELS_ENTRY, PROJECT_ENTRY, RULES_ENTRY,
};
use annot_blobstore::BlobStorage;
use annot_types::{
    split_extension, BlobVariant, Document, DocumentId, Label, Project, ProjectId, Rule,
};
use tracing::{debug, info, warn};

/// Id given to the synthetic project wrapping a batch export.
const BATCH_PROJECT_ID: ProjectId = ProjectId(0);

/// What made it into an export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub documents: usize,
    pub blobs_written: usize,
    /// Documents with a storage id whose original blob could not be read.
    pub missing_originals: Vec<DocumentId>,
    /// Processed documents whose annotated blob could not be read.
    pub missing_annotated: Vec<DocumentId>,
}

impl ExportReport {
    /// True when every expected blob was included.
    pub fn is_complete(&self) -> bool {
        self.missing_originals.is_empty() && self.missing_annotated.is_empty()
    }
}

/// Finished archive bytes, ready for a [`DestinationSink`](crate::DestinationSink).
#[derive(Debug, Clone)]
pub struct ExportedArchive {
    pub kind: ArchiveKind,
    pub bytes: Vec<u8>,
    pub suggested_file_name: String,
    pub sealed: bool,
    pub report: ExportReport,
}

/// Builds archives from detached snapshots and blob storage.
pub struct ArchiveBuilder<'a> {
    storage: &'a dyn BlobStorage,
    config: &'a ArchiveConfig,
}

impl<'a> ArchiveBuilder<'a> {
    pub fn new(storage: &'a dyn BlobStorage, config: &'a ArchiveConfig) -> Self {
        Self { storage, config }
    }

    /// Exports a project with all of its documents.
    pub async fn export_project(
        &self,
        project: &Project,
        documents: &[Document],
        password: Option<&str>,
    ) -> ArchiveResult<ExportedArchive> {
        info!(
            project_id = %project.id,
            documents = documents.len(),
            sealed = password.is_some(),
            "Exporting project archive"
        );

        if let Some(stray) = documents.iter().find(|d| d.project_id != project.id) {
            return Err(ArchiveError::schema(
                ArchiveKind::Project,
                format!(
                    "document {} belongs to project {}, not {}",
                    stray.id, stray.project_id, project.id
                ),
            ));
        }

        let mut container = self.container();
        container.add_json(PROJECT_ENTRY, project)?;
        container.add_json(DOCUMENTS_ENTRY, documents)?;

        let mut report = ExportReport {
            documents: documents.len(),
            ..ExportReport::default()
        };
        for document in documents {
            let Some(storage_id) = &document.storage_id else {
                continue;
            };
            for (variant, bytes) in self.collect_blobs(document, &mut report).await {
                let path = project_blob_path(storage_id, variant, document.extension());
                // Documents sharing a storage id share one entry.
                if container.contains(&path) {
                    debug!(document_id = %document.id, %path, "Blob already in archive");
                    continue;
                }
                container.add(path, bytes)?;
                report.blobs_written += 1;
            }
        }

        self.finish(
            ArchiveKind::Project,
            container,
            file_name(&project.name, ArchiveKind::Project),
            password,
            report,
        )
    }

    /// Exports an ad-hoc selection of documents as a minimal project.
    ///
    /// The documents may come from different projects; their detached
    /// copies are re-pointed at the synthetic project.
    pub async fn export_batch(
        &self,
        name: &str,
        documents: &[Document],
        password: Option<&str>,
    ) -> ArchiveResult<ExportedArchive> {
        let mut project = Project::new(BATCH_PROJECT_ID, name);
        project.description = format!("Batch export of {} documents", documents.len());

        let documents: Vec<Document> = documents
            .iter()
            .cloned()
            .map(|mut d| {
                d.project_id = BATCH_PROJECT_ID;
                d
            })
            .collect();

        self.export_project(&project, &documents, password).await
    }

    /// Exports one document with its labels and rules.
    pub async fn export_document(
        &self,
        document: &Document,
        labels: &[Label],
        rules: &[Rule],
        password: Option<&str>,
    ) -> ArchiveResult<ExportedArchive> {
        info!(document_id = %document.id, "Exporting document archive");

        // Scoped labels and rules travel in their own entries.
        let snapshot = Document {
            labels: Vec::new(),
            rules: Vec::new(),
            ..document.clone()
        };
        let mut container = self.container();
        container.add_json(DOCUMENT_ENTRY, &snapshot)?;
        container.add_json(LABELS_ENTRY, labels)?;
        container.add_json(RULES_ENTRY, rules)?;

        let mut report = ExportReport {
            documents: 1,
            ..ExportReport::default()
        };
        for (variant, bytes) in self.collect_blobs(document, &mut report).await {
            container.add(document_blob_path(variant, document.extension()), bytes)?;
            report.blobs_written += 1;
        }

        let (stem, _) = split_extension(&document.name);
        self.finish(
            ArchiveKind::Document,
            container,
            file_name(stem, ArchiveKind::Document),
            password,
            report,
        )
    }

    pub async fn export_labels(
        &self,
        labels: &[Label],
        password: Option<&str>,
    ) -> ArchiveResult<ExportedArchive> {
        let mut container = self.container();
        container.add_json(LABELS_ENTRY, labels)?;
        self.finish(
            ArchiveKind::Labels,
            container,
            file_name("labels", ArchiveKind::Labels),
            password,
            ExportReport::default(),
        )
    }

    pub async fn export_rules(
        &self,
        rules: &[Rule],
        password: Option<&str>,
    ) -> ArchiveResult<ExportedArchive> {
        let mut container = self.container();
        container.add_json(RULES_ENTRY, rules)?;
        self.finish(
            ArchiveKind::Rules,
            container,
            file_name("rules", ArchiveKind::Rules),
            password,
            ExportReport::default(),
        )
    }

    fn container(&self) -> ContainerBuilder {
        ContainerBuilder::with_compression_level(self.config.compression_level)
    }

    /// Fetches the blobs a document should carry. Failures are recorded in
    /// `report` and skipped.
    async fn collect_blobs(
        &self,
        document: &Document,
        report: &mut ExportReport,
    ) -> Vec<(BlobVariant, Vec<u8>)> {
        let Some(storage_id) = &document.storage_id else {
            return Vec::new();
        };
        let ext = document.extension();
        let mut blobs = Vec::with_capacity(2);

        if !storage_id.is_path_safe() {
            warn!(document_id = %document.id, storage_id = %storage_id, "Unusable storage id, skipping blobs");
            report.missing_originals.push(document.id);
            return blobs;
        }

        match self.storage.get(storage_id, ext, BlobVariant::Original).await {
            Ok(bytes) => blobs.push((BlobVariant::Original, bytes)),
            Err(e) => {
                warn!(
                    document_id = %document.id,
                    storage_id = %storage_id,
                    backend = self.storage.backend_name(),
                    error = %e,
                    "Original blob unavailable, exporting metadata only"
                );
                report.missing_originals.push(document.id);
            }
        }

        if !document.status.has_annotated_output() {
            debug!(document_id = %document.id, status = %document.status, "No annotated blob expected");
            return blobs;
        }

        match self.storage.get(storage_id, ext, BlobVariant::Annotated).await {
            Ok(bytes) => blobs.push((BlobVariant::Annotated, bytes)),
            Err(e) => {
                warn!(
                    document_id = %document.id,
                    storage_id = %storage_id,
                    status = %document.status,
                    error = %e,
                    "Annotated blob missing for processed document"
                );
                report.missing_annotated.push(document.id);
            }
        }

        blobs
    }

    fn finish(
        &self,
        kind: ArchiveKind,
        container: ContainerBuilder,
        suggested_file_name: String,
        password: Option<&str>,
        report: ExportReport,
    ) -> ArchiveResult<ExportedArchive> {
        let plain = container.finish()?;
        let (bytes, sealed) = match password {
            Some(password) => (
                annot_crypto::seal(&plain, password, &self.config.kdf.params())?,
                true,
            ),
            None => (plain, false),
        };

        info!(
            %kind,
            size_bytes = bytes.len(),
            blobs = report.blobs_written,
            missing = report.missing_originals.len() + report.missing_annotated.len(),
            sealed,
            "Archive built"
        );

        Ok(ExportedArchive {
            kind,
            bytes,
            suggested_file_name,
            sealed,
            report,
        })
    }
}

/// Suggested file name: `stem` with characters unsafe on common
/// filesystems replaced, plus the kind's extension.
fn file_name(stem: &str, kind: ArchiveKind) -> String {
    let cleaned: String = stem
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = if cleaned.is_empty() { "export" } else { cleaned.as_str() };
    format!("{stem}{}", kind.extension())
}
