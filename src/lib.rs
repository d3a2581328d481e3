// src/lib.rs
// Public library surface for the `feedcheck` binary and integration tests.

pub mod catalog;
pub mod checker;
pub mod config;
pub mod error;
pub mod observe;
pub mod probe;
pub mod report;

// ---- Re-exports for stable public API ----
pub use crate::catalog::{FeedEntry, SourceId, WorkItem};
pub use crate::checker::{check, FailureKind, FailureRecord, LivenessChecker, RunReport};
pub use crate::config::CheckerConfig;
pub use crate::error::{CatalogError, LoadFailure};
pub use crate::observe::{ProbeEvent, ProbeSink, TracingSink};
pub use crate::probe::{HttpTransport, ProbeOutcome, Transport};
