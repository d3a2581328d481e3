// src/catalog/mod.rs
//! Catalog documents on disk → flat list of `WorkItem`s.

pub mod loader;
pub mod types;

pub use loader::{load_dir, load_document, load_topic, topics, CatalogLoad};
pub use types::{FeedCollection, FeedEntry, SourceId, WorkItem};
