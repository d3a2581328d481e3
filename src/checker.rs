// src/checker.rs
//! # Liveness Checker
//! Probes every work item under a fixed concurrency cap and aggregates the
//! non-success outcomes into `FailureRecord`s.
//!
//! Each item runs in its own spawned task; a semaphore bounds how many of
//! them may be inside the network call at once. Outcomes are returned by
//! value through the `JoinSet`, so the failure list is owned by the single
//! aggregating loop and never shared between workers. The run finishes only
//! after every submitted item has produced an outcome.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use metrics::gauge;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::catalog::types::{SourceId, WorkItem};
use crate::observe::{
    ensure_metrics_described, record_probe_metrics, ProbeEvent, ProbeSink, TracingSink,
};
use crate::probe::{classify, ProbeOutcome, Transport};

pub const DEFAULT_CONCURRENCY: usize = 20;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const CANCELLED_DESCRIPTION: &str = "cancelled before completion";
const PANICKED_DESCRIPTION: &str = "probe task panicked";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "status", rename_all = "snake_case")]
pub enum FailureKind {
    Http(u16),
    Transport,
    /// The run was cancelled before this item produced an outcome.
    Cancelled,
}

/// One feed that did not answer with HTTP 200.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub name: String,
    pub url: String,
    pub source: SourceId,
    pub error: String,
    pub kind: FailureKind,
}

impl FailureRecord {
    /// `None` for `Success`.
    pub fn from_outcome(item: &WorkItem, outcome: &ProbeOutcome) -> Option<Self> {
        let kind = match outcome {
            ProbeOutcome::Success => return None,
            ProbeOutcome::HttpFailure(code) => FailureKind::Http(*code),
            ProbeOutcome::TransportFailure(_) => FailureKind::Transport,
        };
        Some(Self {
            name: item.entry.name.clone(),
            url: item.entry.url.clone(),
            source: item.source.clone(),
            error: outcome.description().unwrap_or_default(),
            kind,
        })
    }

    pub fn cancelled(item: &WorkItem) -> Self {
        Self {
            name: item.entry.name.clone(),
            url: item.entry.url.clone(),
            source: item.source.clone(),
            error: CANCELLED_DESCRIPTION.to_string(),
            kind: FailureKind::Cancelled,
        }
    }
}

/// Aggregate of one run. `succeeded + failures.len() == total` always holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub total: usize,
    pub succeeded: usize,
    /// Completion order; do not rely on it.
    pub failures: Vec<FailureRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    fn empty(at: DateTime<Utc>) -> Self {
        Self {
            total: 0,
            succeeded: 0,
            failures: Vec::new(),
            started_at: at,
            finished_at: at,
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn cancelled(&self) -> usize {
        self.failures
            .iter()
            .filter(|f| f.kind == FailureKind::Cancelled)
            .count()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Issue one probe bounded by `timeout`. Never fails: every path ends in an outcome.
pub async fn probe(transport: &dyn Transport, url: &str, timeout: Duration) -> ProbeOutcome {
    match tokio::time::timeout(timeout, transport.get(url)).await {
        Ok(result) => classify(result),
        Err(_) => ProbeOutcome::TransportFailure(format!("timed out after {timeout:?}")),
    }
}

#[derive(Clone)]
pub struct LivenessChecker {
    transport: Arc<dyn Transport>,
    sink: Arc<dyn ProbeSink>,
    concurrency: usize,
    timeout: Duration,
}

impl LivenessChecker {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            sink: Arc::new(TracingSink),
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProbeSink>) -> Self {
        self.sink = sink;
        self
    }

    /// `0` is treated as `1`.
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probe every item; returns once all of them have an outcome.
    pub async fn run(&self, items: Vec<WorkItem>) -> RunReport {
        self.run_until(items, std::future::pending::<()>()).await
    }

    /// Like [`run`](Self::run), but aborts outstanding probes once `cancel`
    /// resolves. Items that already finished keep their outcome; the rest are
    /// reported with `FailureKind::Cancelled`.
    pub async fn run_until<F>(&self, items: Vec<WorkItem>, cancel: F) -> RunReport
    where
        F: Future<Output = ()>,
    {
        let started_at = Utc::now();
        if items.is_empty() {
            return RunReport::empty(started_at);
        }

        ensure_metrics_described();
        let total = items.len();
        gauge!("feedcheck_run_last_total").set(total as f64);
        info!(
            transport = self.transport.name(),
            concurrency = self.concurrency,
            timeout_ms = self.timeout.as_millis() as u64,
            "Testing {} feeds total",
            total
        );

        let items: Arc<[WorkItem]> = items.into();
        let semaphore = Arc::new(Semaphore::new(self.concurrency.min(Semaphore::MAX_PERMITS)));
        let mut workers = JoinSet::new();

        for idx in 0..total {
            let items = Arc::clone(&items);
            let semaphore = Arc::clone(&semaphore);
            let transport = Arc::clone(&self.transport);
            let sink = Arc::clone(&self.sink);
            let timeout = self.timeout;

            workers.spawn(async move {
                let item = &items[idx];
                // The semaphore is never closed, so acquire only fails if that changes.
                let Ok(_permit) = semaphore.acquire().await else {
                    return (
                        idx,
                        ProbeOutcome::TransportFailure("probe scheduler closed".to_string()),
                    );
                };

                let t0 = Instant::now();
                let outcome = probe(transport.as_ref(), &item.entry.url, timeout).await;
                let elapsed = t0.elapsed();

                record_probe_metrics(&outcome, elapsed);
                sink.record(&ProbeEvent {
                    name: item.entry.name.clone(),
                    url: item.entry.url.clone(),
                    source: item.source.clone(),
                    outcome: outcome.clone(),
                    elapsed,
                });
                (idx, outcome)
            });
        }

        let mut reported = vec![false; total];
        let mut failures = Vec::new();
        let mut succeeded = 0usize;
        let mut cancelled = false;
        tokio::pin!(cancel);

        loop {
            tokio::select! {
                joined = workers.join_next() => match joined {
                    None => break,
                    Some(Ok((idx, outcome))) => {
                        reported[idx] = true;
                        match FailureRecord::from_outcome(&items[idx], &outcome) {
                            Some(record) => failures.push(record),
                            None => succeeded += 1,
                        }
                    }
                    // Aborted or panicked; accounted for below via `reported`.
                    Some(Err(_)) => {}
                },
                _ = &mut cancel, if !cancelled => {
                    cancelled = true;
                    warn!("run cancelled, aborting outstanding probes");
                    workers.abort_all();
                }
            }
        }

        // Tasks that never handed back an outcome were aborted or panicked.
        for (idx, _) in reported.iter().enumerate().filter(|(_, done)| !**done) {
            let item = &items[idx];
            if cancelled {
                failures.push(FailureRecord::cancelled(item));
                continue;
            }
            let outcome = ProbeOutcome::TransportFailure(PANICKED_DESCRIPTION.to_string());
            warn!(name = %item.entry.name, url = %item.entry.url, "probe task panicked");
            failures.extend(FailureRecord::from_outcome(item, &outcome));
        }

        info!(
            "Testing complete: {} failed out of {}",
            failures.len(),
            total
        );

        RunReport {
            total,
            succeeded,
            failures,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

/// Probe `items` with at most `concurrency_limit` probes in flight.
pub async fn check(
    transport: Arc<dyn Transport>,
    items: Vec<WorkItem>,
    concurrency_limit: usize,
    timeout: Duration,
) -> RunReport {
    LivenessChecker::new(transport)
        .with_concurrency(concurrency_limit)
        .with_timeout(timeout)
        .run(items)
        .await
}
