//! Label and extraction-rule records.
//!
//! Both are configuration carried verbatim through export and import:
//! fields this build does not know about are kept in `extra` and written
//! back unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An annotation label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
            description: None,
            extra: Map::new(),
        }
    }
}

/// An extraction rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Rule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            pattern: None,
            extra: Map::new(),
        }
    }
}

/// Appends each incoming record whose content is not already present.
///
/// Duplicates are judged by full content, not by name. Returns the number
/// of records appended.
pub fn merge_unique<T>(existing: &mut Vec<T>, incoming: impl IntoIterator<Item = T>) -> usize
where
    T: PartialEq,
{
    let mut added = 0;
    for item in incoming {
        if !existing.contains(&item) {
            existing.push(item);
            added += 1;
        }
    }
    added
}
