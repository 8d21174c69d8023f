use crate::config::{Label, Rule};
use crate::ids::{DocumentId, ProjectId, StorageId};
use crate::naming::file_extension;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a document in the annotation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentStatus {
    Ready,
    #[serde(rename = "In Progress", alias = "Processing")]
    InProgress,
    Processed,
    Review,
    Annotated,
    Error,
}

impl DocumentStatus {
    /// Whether a document in this status is expected to own an annotated blob.
    #[must_use]
    pub const fn has_annotated_output(self) -> bool {
        matches!(self, Self::Processed | Self::Review | Self::Annotated)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "Ready",
            Self::InProgress => "In Progress",
            Self::Processed => "Processed",
            Self::Review => "Review",
            Self::Annotated => "Annotated",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Ready" => Ok(Self::Ready),
            "In Progress" | "Processing" => Ok(Self::InProgress),
            "Processed" => Ok(Self::Processed),
            "Review" => Ok(Self::Review),
            "Annotated" => Ok(Self::Annotated),
            "Error" => Ok(Self::Error),
            other => Err(crate::Error::UnknownStatus(other.to_string())),
        }
    }
}

/// Which of a document's two blobs is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobVariant {
    Original,
    Annotated,
}

impl BlobVariant {
    pub const ALL: [BlobVariant; 2] = [BlobVariant::Original, BlobVariant::Annotated];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Annotated => "annotated",
        }
    }
}

impl fmt::Display for BlobVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document snapshot as carried in `documents.json` / `document.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub project_id: ProjectId,
    pub name: String,
    pub status: DocumentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_id: Option<StorageId>,
    #[serde(default)]
    pub token_count: u64,
    #[serde(default)]
    pub size: u64,
    pub date: DateTime<Utc>,
    /// Labels scoped to this document, on top of its project's.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,
}

impl Document {
    /// File extension of the document name, including the dot.
    #[must_use]
    pub fn extension(&self) -> &str {
        file_extension(&self.name)
    }
}
