//! Archive import with identity remapping.
//!
//! Every import runs in two phases. The structural phase unseals and
//! parses the archive, validates its metadata and checks project
//! membership without side effects. Only then are ids allocated and blobs
//! written, so a wrong password or a malformed file leaves the target
//! store untouched.
//!
//! Imported records are returned to the caller; merging them into the live
//! store is the caller's job.

use crate::allocator::IdAllocator;
use crate::codec::{is_container, Container};
use crate::dedup::{dedup_name, NameScope};
use crate::error::{ArchiveError, ArchiveResult};
use crate::layout::{
    document_blob_path, project_blob_path, unseal, ArchiveKind, DOCUMENTS_ENTRY, DOCUMENT_ENTRY,
    LABELS_ENTRY, PROJECT_ENTRY, RULES_ENTRY,
};
use annot_blobstore::BlobStorage;
use annot_types::{
    file_extension, BlobVariant, Document, DocumentId, Label, Project, ProjectId, Rule, StorageId,
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Names already taken in the target store, captured once per import.
#[derive(Debug, Clone, Default)]
pub struct ImportScope {
    pub project_names: HashSet<String>,
    pub document_names: HashSet<String>,
}

impl ImportScope {
    pub fn new<P, D>(project_names: P, document_names: D) -> Self
    where
        P: IntoIterator<Item = String>,
        D: IntoIterator<Item = String>,
    {
        Self {
            project_names: project_names.into_iter().collect(),
            document_names: document_names.into_iter().collect(),
        }
    }
}

/// What an import restored and what it had to leave out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub documents: usize,
    pub blobs_restored: usize,
    /// Documents whose original blob was not in the archive.
    pub missing_originals: Vec<DocumentId>,
    /// Processed documents whose annotated blob was not in the archive.
    pub missing_annotated: Vec<DocumentId>,
    /// Blobs found in the archive that storage refused.
    pub failed_writes: Vec<(DocumentId, BlobVariant)>,
    /// `(archived name, imported name)` for every record that was renamed.
    pub renamed: Vec<(String, String)>,
}

impl ImportReport {
    /// True when every expected blob was restored.
    pub fn is_complete(&self) -> bool {
        self.missing_originals.is_empty()
            && self.missing_annotated.is_empty()
            && self.failed_writes.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ImportedProject {
    pub project: Project,
    pub documents: Vec<Document>,
    pub report: ImportReport,
}

#[derive(Debug, Clone)]
pub struct ImportedDocument {
    pub document: Document,
    /// Labels carried by the archive, to be merged by content.
    pub labels: Vec<Label>,
    /// Rules carried by the archive, to be merged by content.
    pub rules: Vec<Rule>,
    pub report: ImportReport,
}

/// Result of [`ArchiveImporter::inspect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// `None` when the container matches no known layout.
    pub kind: Option<ArchiveKind>,
    pub sealed: bool,
    /// Entry paths with their uncompressed sizes.
    pub entries: Vec<(String, usize)>,
}

/// A document whose metadata has been validated but not yet remapped.
struct Pending {
    archived: Document,
    ext: String,
}

/// Restores archives into blob storage as brand-new records.
pub struct ArchiveImporter<'a> {
    storage: &'a dyn BlobStorage,
}

impl<'a> ArchiveImporter<'a> {
    pub fn new(storage: &'a dyn BlobStorage) -> Self {
        Self { storage }
    }

    /// Imports a project archive (including batch exports).
    pub async fn import_project(
        &self,
        bytes: &[u8],
        password: Option<&str>,
        scope: &ImportScope,
        ids: &mut dyn IdAllocator,
    ) -> ArchiveResult<ImportedProject> {
        let kind = ArchiveKind::Project;
        let container = open(bytes, password, kind)?;
        let archived: Project = read_json(&container, kind, PROJECT_ENTRY)?;
        let documents: Vec<Document> = read_json(&container, kind, DOCUMENTS_ENTRY)?;

        if let Some(stray) = documents.iter().find(|d| d.project_id != archived.id) {
            return Err(ArchiveError::schema(
                kind,
                format!(
                    "document {} belongs to project {}, not {}",
                    stray.id, stray.project_id, archived.id
                ),
            ));
        }

        info!(
            project_id = %archived.id,
            documents = documents.len(),
            sealed = !is_container(bytes),
            "Importing project archive"
        );

        // The extension is fixed before any renaming.
        let pending: Vec<Pending> = documents
            .into_iter()
            .map(|archived| Pending {
                ext: file_extension(&archived.name).to_string(),
                archived,
            })
            .collect();

        let project_id = ids.next_project_id()?;
        let mut document_ids = Vec::with_capacity(pending.len());
        for _ in &pending {
            document_ids.push(ids.next_document_id()?);
        }

        let mut report = ImportReport {
            documents: pending.len(),
            ..ImportReport::default()
        };

        let project_name = dedup_name(&archived.name, &scope.project_names);
        if project_name != archived.name {
            report.renamed.push((archived.name.clone(), project_name.clone()));
        }
        let project = Project {
            id: project_id,
            name: project_name,
            created_at: Utc::now(),
            ..archived
        };

        let mut names = NameScope::new(scope.document_names.iter().cloned());
        let mut imported = Vec::with_capacity(pending.len());
        for (entry, id) in pending.into_iter().zip(document_ids) {
            let document = self
                .restore(&container, entry, id, project_id, &mut names, &mut report, project_blob_path)
                .await;
            imported.push(document);
        }

        info!(
            project_id = %project.id,
            name = %project.name,
            documents = imported.len(),
            blobs = report.blobs_restored,
            missing = report.missing_originals.len() + report.missing_annotated.len(),
            failed_writes = report.failed_writes.len(),
            "Project imported"
        );

        Ok(ImportedProject {
            project,
            documents: imported,
            report,
        })
    }

    /// Imports a single-document archive into `target`.
    ///
    /// `existing_names` are the document names already used in the target
    /// project.
    pub async fn import_document(
        &self,
        bytes: &[u8],
        password: Option<&str>,
        target: ProjectId,
        existing_names: &HashSet<String>,
        ids: &mut dyn IdAllocator,
    ) -> ArchiveResult<ImportedDocument> {
        let kind = ArchiveKind::Document;
        let container = open(bytes, password, kind)?;
        let archived: Document = read_json(&container, kind, DOCUMENT_ENTRY)?;
        let labels: Vec<Label> = read_optional_json(&container, kind, LABELS_ENTRY)?;
        let rules: Vec<Rule> = read_optional_json(&container, kind, RULES_ENTRY)?;

        info!(
            document_id = %archived.id,
            target_project = %target,
            labels = labels.len(),
            rules = rules.len(),
            "Importing document archive"
        );

        let pending = Pending {
            ext: file_extension(&archived.name).to_string(),
            archived,
        };
        let id = ids.next_document_id()?;

        let mut report = ImportReport {
            documents: 1,
            ..ImportReport::default()
        };
        let mut names = NameScope::new(existing_names.iter().cloned());
        let document = self
            .restore(&container, pending, id, target, &mut names, &mut report, |_, variant, ext| {
                document_blob_path(variant, ext)
            })
            .await;

        info!(
            document_id = %document.id,
            name = %document.name,
            blobs = report.blobs_restored,
            "Document imported"
        );

        Ok(ImportedDocument {
            document,
            labels,
            rules,
            report,
        })
    }

    pub fn import_labels(
        &self,
        bytes: &[u8],
        password: Option<&str>,
    ) -> ArchiveResult<Vec<Label>> {
        let container = open(bytes, password, ArchiveKind::Labels)?;
        let labels: Vec<Label> = read_json(&container, ArchiveKind::Labels, LABELS_ENTRY)?;
        info!(count = labels.len(), "Labels imported");
        Ok(labels)
    }

    pub fn import_rules(
        &self,
        bytes: &[u8],
        password: Option<&str>,
    ) -> ArchiveResult<Vec<Rule>> {
        let container = open(bytes, password, ArchiveKind::Rules)?;
        let rules: Vec<Rule> = read_json(&container, ArchiveKind::Rules, RULES_ENTRY)?;
        info!(count = rules.len(), "Rules imported");
        Ok(rules)
    }

    /// Unseals and parses an archive and reports what it holds. Nothing is
    /// allocated or written.
    pub fn inspect(&self, bytes: &[u8], password: Option<&str>) -> ArchiveResult<ArchiveSummary> {
        let sealed = !is_container(bytes);
        let plain = unseal(bytes, password)?;
        let container = Container::parse(&plain)?;
        Ok(ArchiveSummary {
            kind: ArchiveKind::detect(&container),
            sealed,
            entries: container
                .paths()
                .map(|path| {
                    let size = container.get(path).map_or(0, <[u8]>::len);
                    (path.to_string(), size)
                })
                .collect(),
        })
    }

    /// Remaps one validated document and copies its blobs under a fresh
    /// storage id. Blob problems are recorded in `report`.
    #[allow(clippy::too_many_arguments)]
    async fn restore(
        &self,
        container: &Container,
        pending: Pending,
        id: DocumentId,
        project_id: ProjectId,
        names: &mut NameScope,
        report: &mut ImportReport,
        blob_path: impl Fn(&StorageId, BlobVariant, &str) -> String,
    ) -> Document {
        let Pending { archived, ext } = pending;

        let name = names.claim(&archived.name);
        if name != archived.name {
            debug!(from = %archived.name, to = %name, "Renamed imported document");
            report.renamed.push((archived.name.clone(), name.clone()));
        }

        let old_storage_id = archived.storage_id.clone();
        let mut document = Document {
            id,
            project_id,
            name,
            storage_id: None,
            ..archived
        };

        let Some(old_storage_id) = old_storage_id else {
            debug!(document_id = %id, "Document has no stored file");
            return document;
        };
        let storage_id = StorageId::generate();

        for variant in BlobVariant::ALL {
            let exact = blob_path(&old_storage_id, variant, &ext);
            let stem = blob_path(&old_storage_id, variant, "");
            let Some(data) = locate(container, &exact, &stem) else {
                match variant {
                    BlobVariant::Original => {
                        warn!(
                            document_id = %id,
                            storage_id = %old_storage_id,
                            path = %exact,
                            "Original blob missing from archive, importing metadata only"
                        );
                        report.missing_originals.push(id);
                    }
                    BlobVariant::Annotated if document.status.has_annotated_output() => {
                        warn!(
                            document_id = %id,
                            status = %document.status,
                            path = %exact,
                            "Annotated blob missing for processed document"
                        );
                        report.missing_annotated.push(id);
                    }
                    BlobVariant::Annotated => {}
                }
                continue;
            };

            match self.storage.put(&storage_id, &ext, variant, data).await {
                Ok(()) => {
                    debug!(document_id = %id, %storage_id, %variant, size = data.len(), "Blob restored");
                    report.blobs_restored += 1;
                }
                Err(e) => {
                    warn!(
                        document_id = %id,
                        %storage_id,
                        %variant,
                        backend = self.storage.backend_name(),
                        error = %e,
                        "Failed to store imported blob"
                    );
                    report.failed_writes.push((id, variant));
                }
            }
        }

        document.storage_id = Some(storage_id);
        document
    }
}

/// Unseals, parses and checks the archive is of `kind`.
fn open(bytes: &[u8], password: Option<&str>, kind: ArchiveKind) -> ArchiveResult<Container> {
    let plain = unseal(bytes, password)?;
    let container = Container::parse(&plain)?;
    kind.require(&container)?;
    Ok(container)
}

fn read_json<T: DeserializeOwned>(
    container: &Container,
    kind: ArchiveKind,
    entry: &str,
) -> ArchiveResult<T> {
    let data = container
        .get(entry)
        .ok_or_else(|| ArchiveError::schema(kind, format!("missing {entry}")))?;
    serde_json::from_slice(data).map_err(|e| ArchiveError::schema(kind, format!("{entry}: {e}")))
}

fn read_optional_json<T: DeserializeOwned + Default>(
    container: &Container,
    kind: ArchiveKind,
    entry: &str,
) -> ArchiveResult<T> {
    if container.contains(entry) {
        read_json(container, kind, entry)
    } else {
        Ok(T::default())
    }
}

/// Finds a blob by exact path, falling back to the single entry that shares
/// `stem` and differs only in extension.
fn locate<'c>(container: &'c Container, exact: &str, stem: &str) -> Option<&'c [u8]> {
    if let Some(data) = container.get(exact) {
        return Some(data);
    }

    let mut candidates = container.entries_under(stem).filter(|(path, _)| {
        let rest = &path[stem.len()..];
        rest.is_empty() || (rest.starts_with('.') && !rest.contains('/'))
    });
    let (path, data) = candidates.next()?;
    if candidates.next().is_some() {
        warn!(stem, "Several blob candidates in archive, none restored");
        return None;
    }
    debug!(expected = exact, found = path, "Blob found under a different extension");
    Some(data)
}
