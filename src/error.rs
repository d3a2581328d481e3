// src/error.rs
//! Typed errors for the catalog boundary.
//!
//! Probe failures are never errors: they are data (`ProbeOutcome` /
//! `FailureRecord`). Only the catalog side has failure modes that callers
//! branch on.

use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::types::SourceId;

/// A single catalog document could not be used. Sibling documents still load.
#[derive(Debug, Error)]
pub enum LoadFailure {
    #[error("error reading {source_id}: {error}")]
    Read {
        source_id: SourceId,
        #[source]
        error: std::io::Error,
    },

    #[error("error parsing {source_id}: {error}")]
    Parse {
        source_id: SourceId,
        #[source]
        error: serde_json::Error,
    },
}

impl LoadFailure {
    pub fn source_id(&self) -> &SourceId {
        match self {
            LoadFailure::Read { source_id, .. } | LoadFailure::Parse { source_id, .. } => {
                source_id
            }
        }
    }
}

/// The catalog as a whole is unusable; no probes are attempted.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog directory {} not found", dir.display())]
    Missing { dir: PathBuf },

    #[error("catalog directory {} unreadable: {error}", dir.display())]
    Unreadable {
        dir: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("topic '{topic}' not found in catalog")]
    UnknownTopic { topic: String },

    #[error(transparent)]
    Document(#[from] LoadFailure),
}
