use crate::config::{Label, Rule};
use crate::ids::ProjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A project snapshot as carried in `project.json`.
///
/// Labels and rules are project-scoped configuration and travel verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Project {
    /// Creates an empty project stamped with the current time.
    pub fn new(id: ProjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            created_at: Utc::now(),
            labels: Vec::new(),
            rules: Vec::new(),
        }
    }
}
