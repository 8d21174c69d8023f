//! Identifier allocation for imported records.

use crate::error::{ArchiveError, ArchiveResult};
use annot_types::{DocumentId, ProjectId};

/// Hands out fresh project and document ids.
///
/// Implemented by the live store; tests use [`SequentialAllocator`] for
/// deterministic sequences.
pub trait IdAllocator: Send {
    fn next_project_id(&mut self) -> ArchiveResult<ProjectId>;
    fn next_document_id(&mut self) -> ArchiveResult<DocumentId>;
}

/// Monotonic counters starting from caller-supplied values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequentialAllocator {
    next_project: i64,
    next_document: i64,
}

impl SequentialAllocator {
    /// Starts the counters at the given values, which must be positive.
    pub fn new(next_project: i64, next_document: i64) -> ArchiveResult<Self> {
        if next_project <= 0 || next_document <= 0 {
            return Err(ArchiveError::IdentifierExhaustion(format!(
                "counters must be positive (project {next_project}, document {next_document})"
            )));
        }
        Ok(Self {
            next_project,
            next_document,
        })
    }

    /// Starts one past the largest existing ids (or at 1 for an empty store).
    pub fn after<P, D>(projects: P, documents: D) -> ArchiveResult<Self>
    where
        P: IntoIterator<Item = ProjectId>,
        D: IntoIterator<Item = DocumentId>,
    {
        let max_project = projects.into_iter().map(ProjectId::get).max().unwrap_or(0);
        let max_document = documents.into_iter().map(DocumentId::get).max().unwrap_or(0);
        Self::new(successor(max_project.max(0))?, successor(max_document.max(0))?)
    }

    /// The id the next project allocation will return.
    pub fn peek_project(&self) -> ProjectId {
        ProjectId(self.next_project)
    }

    /// The id the next document allocation will return.
    pub fn peek_document(&self) -> DocumentId {
        DocumentId(self.next_document)
    }
}

fn successor(id: i64) -> ArchiveResult<i64> {
    id.checked_add(1)
        .ok_or_else(|| ArchiveError::IdentifierExhaustion(format!("no id after {id}")))
}

impl IdAllocator for SequentialAllocator {
    fn next_project_id(&mut self) -> ArchiveResult<ProjectId> {
        let id = self.next_project;
        self.next_project = successor(id)?;
        Ok(ProjectId(id))
    }

    fn next_document_id(&mut self) -> ArchiveResult<DocumentId> {
        let id = self.next_document;
        self.next_document = successor(id)?;
        Ok(DocumentId(id))
    }
}
