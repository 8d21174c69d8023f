//! Archive kinds, entry names and the sealed/plain sniff.

use crate::codec::{is_container, Container};
use crate::error::{ArchiveError, ArchiveResult};
use annot_types::{BlobVariant, StorageId};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

pub const PROJECT_ENTRY: &str = "project.json";
pub const DOCUMENTS_ENTRY: &str = "documents.json";
pub const DOCUMENT_ENTRY: &str = "document.json";
pub const LABELS_ENTRY: &str = "labels.json";
pub const RULES_ENTRY: &str = "rules.json";
pub const FILES_DIR: &str = "files/";

/// What an archive holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveKind {
    /// A project with all its documents (also used for batch exports).
    Project,
    /// One document with its labels and rules.
    Document,
    Labels,
    Rules,
}

impl ArchiveKind {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Project => ".annproj",
            Self::Document => ".anndoc",
            Self::Labels => ".annlabels",
            Self::Rules => ".annrules",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Project => "Project archive",
            Self::Document => "Document archive",
            Self::Labels => "Labels archive",
            Self::Rules => "Rules archive",
        }
    }

    /// Entries that must be present for this kind.
    pub const fn required_entries(self) -> &'static [&'static str] {
        match self {
            Self::Project => &[PROJECT_ENTRY, DOCUMENTS_ENTRY],
            Self::Document => &[DOCUMENT_ENTRY],
            Self::Labels => &[LABELS_ENTRY],
            Self::Rules => &[RULES_ENTRY],
        }
    }

    /// Guesses the kind from which metadata entries are present.
    ///
    /// A document archive also carries `labels.json`/`rules.json`, so the
    /// richer kinds are checked first.
    pub fn detect(container: &Container) -> Option<Self> {
        [Self::Project, Self::Document, Self::Labels, Self::Rules]
            .into_iter()
            .find(|kind| {
                kind.required_entries()
                    .iter()
                    .all(|entry| container.contains(entry))
            })
    }

    /// Checks the required entries are present, naming the kind that was
    /// found instead when the user picked the wrong file.
    pub fn require(self, container: &Container) -> ArchiveResult<()> {
        let missing: Vec<&str> = self
            .required_entries()
            .iter()
            .copied()
            .filter(|entry| !container.contains(entry))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }

        let reason = match Self::detect(container) {
            Some(found) => format!("found a {found} archive instead"),
            None => format!("missing {}", missing.join(", ")),
        };
        Err(ArchiveError::schema(self, reason))
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Project => "project",
            Self::Document => "document",
            Self::Labels => "labels",
            Self::Rules => "rules",
        })
    }
}

/// Path of a blob inside a project archive, e.g.
/// `files/0190…_original.pdf`.
pub fn project_blob_path(storage_id: &StorageId, variant: BlobVariant, ext: &str) -> String {
    format!("{FILES_DIR}{storage_id}_{variant}{ext}")
}

/// Path of a blob inside a document archive, e.g. `annotated.pdf`.
pub fn document_blob_path(variant: BlobVariant, ext: &str) -> String {
    format!("{variant}{ext}")
}

/// Returns the plain container bytes, opening the envelope if needed.
///
/// Plain containers are recognized by their signature and never touch the
/// password. Sealed input without a password is
/// [`ArchiveError::PasswordRequired`]; anything else is
/// [`ArchiveError::Format`].
pub fn unseal<'a>(bytes: &'a [u8], password: Option<&str>) -> ArchiveResult<Cow<'a, [u8]>> {
    if is_container(bytes) {
        return Ok(Cow::Borrowed(bytes));
    }
    if annot_crypto::is_sealed(bytes) {
        let password = password
            .filter(|p| !p.is_empty())
            .ok_or(ArchiveError::PasswordRequired)?;
        let plain = annot_crypto::open(bytes, password)?;
        return Ok(Cow::Owned(plain));
    }
    Err(ArchiveError::Format(
        "neither an archive container nor a sealed archive".to_string(),
    ))
}
