// src/catalog/types.rs
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Opaque identifier of the document an entry came from (the file name).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(Arc<str>);

impl SourceId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FeedEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            description: None,
        }
    }
}

/// One catalog document: `{ "topic": ..., "feeds": [...] }`. `topic` may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedCollection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub feeds: Vec<FeedEntry>,
}

/// An entry paired with its provenance. Read-only once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub entry: FeedEntry,
    pub source: SourceId,
}

impl FeedCollection {
    /// Declared topic, `None` when missing or blank.
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

impl WorkItem {
    pub fn new(entry: FeedEntry, source: SourceId) -> Self {
        Self { entry, source }
    }
}
