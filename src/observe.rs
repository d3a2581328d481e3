// src/observe.rs
//! Probe observations: the sink seam, its tracing implementation, and metrics.

use std::sync::Mutex;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use tracing::{error, info};

use crate::catalog::types::SourceId;
use crate::probe::ProbeOutcome;

/// One-time metrics registration (so series show up once a recorder is installed).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feedcheck_probes_total", "Probes executed, any outcome.");
        describe_counter!(
            "feedcheck_probe_failures_total",
            "Probes that did not return HTTP 200, labelled by kind."
        );
        describe_histogram!(
            "feedcheck_probe_duration_ms",
            "Wall time of a single probe in milliseconds."
        );
        describe_counter!(
            "feedcheck_catalog_load_errors_total",
            "Catalog documents skipped because they could not be read or parsed."
        );
        describe_gauge!(
            "feedcheck_run_last_total",
            "Number of work items in the most recent run."
        );
    });
}

pub(crate) fn record_probe_metrics(outcome: &ProbeOutcome, elapsed: Duration) {
    counter!("feedcheck_probes_total").increment(1);
    histogram!("feedcheck_probe_duration_ms").record(elapsed.as_secs_f64() * 1_000.0);
    let kind = match outcome {
        ProbeOutcome::Success => return,
        ProbeOutcome::HttpFailure(_) => "http",
        ProbeOutcome::TransportFailure(_) => "transport",
    };
    counter!("feedcheck_probe_failures_total", "kind" => kind).increment(1);
}

/// What a worker reports after each probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeEvent {
    pub name: String,
    pub url: String,
    pub source: SourceId,
    pub outcome: ProbeOutcome,
    pub elapsed: Duration,
}

/// Fire-and-forget destination for probe events. Must not block.
pub trait ProbeSink: Send + Sync {
    fn record(&self, event: &ProbeEvent);
}

/// Default sink: one log line per probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ProbeSink for TracingSink {
    fn record(&self, ev: &ProbeEvent) {
        let elapsed_ms = ev.elapsed.as_millis() as u64;
        match ev.outcome.description() {
            None => info!(
                target: "probe",
                source = %ev.source,
                elapsed_ms,
                "OK: {} ({})",
                ev.name,
                ev.url
            ),
            Some(err) => error!(
                target: "probe",
                source = %ev.source,
                elapsed_ms,
                "FAILED: {} - {} ({}) from {}",
                ev.name,
                err,
                ev.url,
                ev.source
            ),
        }
    }
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProbeSink for NullSink {
    fn record(&self, _event: &ProbeEvent) {}
}

// --- Test helper ---
#[derive(Debug, Default)]
pub struct MemorySink {
    pub events: Mutex<Vec<ProbeEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<ProbeEvent> {
        self.events
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

impl ProbeSink for MemorySink {
    fn record(&self, event: &ProbeEvent) {
        if let Ok(mut v) = self.events.lock() {
            v.push(event.clone());
        }
    }
}
