//! A local annotation workspace on disk.
//!
//! ```text
//! <root>/catalog.json   projects and documents
//! <root>/blobs.duckdb   primary blob store
//! <root>/files/         mirrored blob files
//! ```

use annot_archive::{
    dedup_name, ArchiveBuilder, ArchiveConfig, ArchiveImporter, ExportedArchive, IdAllocator,
    ImportReport, ImportScope, ImportedProject, SequentialAllocator,
};
use annot_blobstore::{BlobStorage, DuckDbBlobStore, FsBlobStore, MirroredBlobStore};
use annot_types::{
    file_extension, merge_unique, BlobVariant, Document, DocumentId, DocumentStatus, Project,
    ProjectId, StorageId,
};
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub const CATALOG_FILE: &str = "catalog.json";
pub const BLOB_DB_FILE: &str = "blobs.duckdb";
pub const BLOB_DIR: &str = "files";

/// Everything the workspace knows besides blob bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub documents: Vec<Document>,
}

/// Outcome of importing a document archive into a project.
#[derive(Debug, Clone)]
pub struct MergedDocument {
    pub document: Document,
    pub report: ImportReport,
    pub labels_added: usize,
    pub rules_added: usize,
}

pub struct LocalWorkspace {
    root: PathBuf,
    catalog: Catalog,
    blobs: MirroredBlobStore,
}

impl LocalWorkspace {
    /// Opens the workspace at `root`, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(root.join(BLOB_DIR))
            .with_context(|| format!("Failed to create workspace at {}", root.display()))?;

        let catalog_path = root.join(CATALOG_FILE);
        let catalog = if catalog_path.exists() {
            let bytes = std::fs::read(&catalog_path).context("Failed to read catalog")?;
            serde_json::from_slice(&bytes).context("Failed to parse catalog")?
        } else {
            Catalog::default()
        };

        let primary = DuckDbBlobStore::open(&root.join(BLOB_DB_FILE))
            .context("Failed to open blob database")?;
        let secondary = FsBlobStore::new(root.join(BLOB_DIR));
        let blobs = MirroredBlobStore::new(Arc::new(primary), Arc::new(secondary));

        info!(
            root = %root.display(),
            projects = catalog.projects.len(),
            documents = catalog.documents.len(),
            "Workspace opened"
        );
        Ok(Self {
            root,
            catalog,
            blobs,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn storage(&self) -> &dyn BlobStorage {
        &self.blobs
    }

    pub fn project(&self, id: ProjectId) -> Result<&Project> {
        self.catalog
            .projects
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| anyhow!("project {id} not found"))
    }

    pub fn document(&self, id: DocumentId) -> Result<&Document> {
        self.catalog
            .documents
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| anyhow!("document {id} not found"))
    }

    pub fn documents_of(&self, project: ProjectId) -> Vec<Document> {
        self.catalog
            .documents
            .iter()
            .filter(|d| d.project_id == project)
            .cloned()
            .collect()
    }

    /// Document names already used in one project.
    pub fn document_names_in(&self, project: ProjectId) -> HashSet<String> {
        self.catalog
            .documents
            .iter()
            .filter(|d| d.project_id == project)
            .map(|d| d.name.clone())
            .collect()
    }

    /// Snapshot of every used project and document name.
    pub fn import_scope(&self) -> ImportScope {
        ImportScope::new(
            self.catalog.projects.iter().map(|p| p.name.clone()),
            self.catalog.documents.iter().map(|d| d.name.clone()),
        )
    }

    /// Allocator continuing after the largest ids in the catalog.
    pub fn allocator(&self) -> Result<SequentialAllocator> {
        Ok(SequentialAllocator::after(
            self.catalog.projects.iter().map(|p| p.id),
            self.catalog.documents.iter().map(|d| d.id),
        )?)
    }

    pub fn create_project(&mut self, name: &str) -> Result<Project> {
        let id = self.allocator()?.next_project_id()?;
        let used: HashSet<String> = self.catalog.projects.iter().map(|p| p.name.clone()).collect();
        let project = Project::new(id, dedup_name(name, &used));
        self.catalog.projects.push(project.clone());
        info!(project_id = %project.id, name = %project.name, "Project created");
        Ok(project)
    }

    /// Copies a local file into the workspace as a new document.
    pub async fn add_file(&mut self, project: ProjectId, path: &Path) -> Result<Document> {
        self.project(project)?;
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("{} has no usable file name", path.display()))?;

        let storage_id = StorageId::generate();
        self.blobs
            .put(&storage_id, file_extension(file_name), BlobVariant::Original, &data)
            .await
            .context("Failed to store file")?;

        let document = Document {
            id: self.allocator()?.next_document_id()?,
            project_id: project,
            name: dedup_name(file_name, &self.document_names_in(project)),
            status: DocumentStatus::Ready,
            storage_id: Some(storage_id),
            token_count: 0,
            size: data.len() as u64,
            date: Utc::now(),
            labels: Vec::new(),
            rules: Vec::new(),
        };
        debug!(document_id = %document.id, name = %document.name, "File added");
        self.catalog.documents.push(document.clone());
        Ok(document)
    }

    pub async fn export_project(
        &self,
        id: ProjectId,
        config: &ArchiveConfig,
        password: Option<&str>,
    ) -> Result<ExportedArchive> {
        let project = self.project(id)?;
        let documents = self.documents_of(id);
        Ok(ArchiveBuilder::new(&self.blobs, config)
            .export_project(project, &documents, password)
            .await?)
    }

    /// Exports the given documents as one batch project archive.
    pub async fn export_batch(
        &self,
        name: &str,
        ids: &[DocumentId],
        config: &ArchiveConfig,
        password: Option<&str>,
    ) -> Result<ExportedArchive> {
        let documents = ids
            .iter()
            .map(|id| self.document(*id).cloned())
            .collect::<Result<Vec<_>>>()?;
        Ok(ArchiveBuilder::new(&self.blobs, config)
            .export_batch(name, &documents, password)
            .await?)
    }

    /// Exports a document with its own labels and rules.
    pub async fn export_document(
        &self,
        id: DocumentId,
        config: &ArchiveConfig,
        password: Option<&str>,
    ) -> Result<ExportedArchive> {
        let document = self.document(id)?;
        Ok(ArchiveBuilder::new(&self.blobs, config)
            .export_document(document, &document.labels, &document.rules, password)
            .await?)
    }

    pub async fn export_labels(
        &self,
        project: ProjectId,
        config: &ArchiveConfig,
        password: Option<&str>,
    ) -> Result<ExportedArchive> {
        let project = self.project(project)?;
        Ok(ArchiveBuilder::new(&self.blobs, config)
            .export_labels(&project.labels, password)
            .await?)
    }

    pub async fn export_rules(
        &self,
        project: ProjectId,
        config: &ArchiveConfig,
        password: Option<&str>,
    ) -> Result<ExportedArchive> {
        let project = self.project(project)?;
        Ok(ArchiveBuilder::new(&self.blobs, config)
            .export_rules(&project.rules, password)
            .await?)
    }

    /// Imports a project archive as a new project.
    pub async fn import_project(
        &mut self,
        bytes: &[u8],
        password: Option<&str>,
    ) -> Result<ImportedProject> {
        let scope = self.import_scope();
        let mut ids = self.allocator()?;
        let imported = ArchiveImporter::new(&self.blobs)
            .import_project(bytes, password, &scope, &mut ids)
            .await?;

        self.catalog.projects.push(imported.project.clone());
        self.catalog
            .documents
            .extend(imported.documents.iter().cloned());
        Ok(imported)
    }

    /// Imports a document archive into `target`. The archived labels and
    /// rules are merged into the new document; the project keeps its own.
    pub async fn import_document(
        &mut self,
        bytes: &[u8],
        password: Option<&str>,
        target: ProjectId,
    ) -> Result<MergedDocument> {
        self.project(target)?;
        let existing = self.document_names_in(target);
        let mut ids = self.allocator()?;
        let imported = ArchiveImporter::new(&self.blobs)
            .import_document(bytes, password, target, &existing, &mut ids)
            .await?;

        let mut document = imported.document;
        let labels_added = merge_unique(&mut document.labels, imported.labels);
        let rules_added = merge_unique(&mut document.rules, imported.rules);
        self.catalog.documents.push(document.clone());

        Ok(MergedDocument {
            document,
            report: imported.report,
            labels_added,
            rules_added,
        })
    }

    /// Merges a labels archive into `target`. Returns how many were new.
    pub fn import_labels(
        &mut self,
        bytes: &[u8],
        password: Option<&str>,
        target: ProjectId,
    ) -> Result<usize> {
        let labels = ArchiveImporter::new(&self.blobs).import_labels(bytes, password)?;
        let project = self.project_mut(target)?;
        Ok(merge_unique(&mut project.labels, labels))
    }

    /// Merges a rules archive into `target`. Returns how many were new.
    pub fn import_rules(
        &mut self,
        bytes: &[u8],
        password: Option<&str>,
        target: ProjectId,
    ) -> Result<usize> {
        let rules = ArchiveImporter::new(&self.blobs).import_rules(bytes, password)?;
        let project = self.project_mut(target)?;
        Ok(merge_unique(&mut project.rules, rules))
    }

    /// Replaces the catalog file via a temporary sibling and a rename.
    pub fn save(&self) -> Result<()> {
        let path = self.root.join(CATALOG_FILE);
        let tmp = self.root.join(format!("{CATALOG_FILE}.tmp"));
        let bytes = serde_json::to_vec_pretty(&self.catalog)?;
        std::fs::write(&tmp, bytes).context("Failed to write catalog")?;
        std::fs::rename(&tmp, &path).context("Failed to replace catalog")?;
        debug!(path = %path.display(), "Catalog saved");
        Ok(())
    }

    fn project_mut(&mut self, id: ProjectId) -> Result<&mut Project> {
        self.catalog
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| anyhow!("project {id} not found"))
    }
}
