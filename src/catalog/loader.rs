// src/catalog/loader.rs
use std::fs;
use std::path::{Path, PathBuf};

use metrics::counter;
use tracing::{error, info, warn};

use crate::catalog::types::{FeedCollection, SourceId, WorkItem};
use crate::error::{CatalogError, LoadFailure};

/// Result of loading a whole catalog directory.
#[derive(Debug, Default)]
pub struct CatalogLoad {
    pub items: Vec<WorkItem>,
    /// Documents that were skipped; their entries are not in `items`.
    pub failures: Vec<LoadFailure>,
    /// Number of documents that loaded successfully.
    pub documents: usize,
}

/// Load every `*.json` document in `dir` into a flat work list.
///
/// A malformed or unreadable document is logged and skipped. Only a missing
/// or unlistable directory fails the whole load.
pub fn load_dir(dir: &Path) -> Result<CatalogLoad, CatalogError> {
    crate::observe::ensure_metrics_described();

    let mut out = CatalogLoad::default();
    for path in json_documents(dir)? {
        match load_document(&path) {
            Ok(collection) => {
                let source = source_id_for(&path);
                info!(
                    "Loaded {} feeds from {}",
                    collection.feeds.len(),
                    source
                );
                out.documents += 1;
                out.items.extend(into_work_items(collection, &source));
            }
            Err(e) => {
                error!("Error loading {}: {}", e.source_id(), e);
                counter!("feedcheck_catalog_load_errors_total").increment(1);
                out.failures.push(e);
            }
        }
    }
    Ok(out)
}

/// Parse one document against the catalog schema.
pub fn load_document(path: &Path) -> Result<FeedCollection, LoadFailure> {
    let source_id = source_id_for(path);
    let content = fs::read_to_string(path).map_err(|error| LoadFailure::Read {
        source_id: source_id.clone(),
        error,
    })?;
    serde_json::from_str(&content).map_err(|error| LoadFailure::Parse { source_id, error })
}

/// Sorted topics of all documents. A document that does not parse, or has no
/// topic, contributes its file stem so it can still be selected by name.
/// A missing directory has no topics.
pub fn topics(dir: &Path) -> Result<Vec<String>, CatalogError> {
    let paths = match json_documents(dir) {
        Ok(paths) => paths,
        Err(CatalogError::Missing { dir }) => {
            warn!("catalog directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };

    let mut topics = Vec::new();
    for path in paths {
        let declared = match load_document(&path) {
            Ok(collection) => collection.topic().map(str::to_string),
            Err(e) => {
                error!("Failed to parse {}: {}, using filename", path.display(), e);
                None
            }
        };
        let topic = declared.or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
        });
        topics.extend(topic);
    }
    topics.sort();
    Ok(topics)
}

/// Work items of the single collection whose topic matches (case-insensitive).
/// Falls back to `<topic>.json` when no document declares that topic.
pub fn load_topic(dir: &Path, topic: &str) -> Result<Vec<WorkItem>, CatalogError> {
    let wanted = topic.to_lowercase();
    for path in json_documents(dir)? {
        if let Ok(collection) = load_document(&path) {
            if collection.topic().map(str::to_lowercase).as_deref() == Some(wanted.as_str()) {
                let source = source_id_for(&path);
                return Ok(into_work_items(collection, &source));
            }
        }
    }

    let fallback = dir.join(format!("{wanted}.json"));
    if !fallback.is_file() {
        return Err(CatalogError::UnknownTopic {
            topic: topic.to_string(),
        });
    }
    let collection = load_document(&fallback)?;
    Ok(into_work_items(collection, &source_id_for(&fallback)))
}

fn into_work_items(collection: FeedCollection, source: &SourceId) -> Vec<WorkItem> {
    collection
        .feeds
        .into_iter()
        .map(|entry| WorkItem::new(entry, source.clone()))
        .collect()
}

fn source_id_for(path: &Path) -> SourceId {
    path.file_name()
        .map(|n| SourceId::new(n.to_string_lossy()))
        .unwrap_or_else(|| SourceId::new(path.to_string_lossy()))
}

/// `*.json` files directly under `dir`, sorted by file name.
fn json_documents(dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    if !dir.exists() {
        return Err(CatalogError::Missing {
            dir: dir.to_path_buf(),
        });
    }
    let entries = fs::read_dir(dir).map_err(|error| CatalogError::Unreadable {
        dir: dir.to_path_buf(),
        error,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                error!("Error listing entry in {}: {}", dir.display(), e);
                counter!("feedcheck_catalog_load_errors_total").increment(1);
                None
            }
        })
        .filter(|p| p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    paths.sort();
    Ok(paths)
}
