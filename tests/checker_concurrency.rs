// tests/checker_concurrency.rs
//
// Concurrency cap, completion-order independence, timeouts and run-level
// cancellation of the liveness checker.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use feed_liveness::observe::MemorySink;
use feed_liveness::probe::{Scripted, ScriptedTransport, Transport, TransportError};
use feed_liveness::{FailureKind, FeedEntry, LivenessChecker, SourceId, WorkItem};

fn items(n: usize, url_for: impl Fn(usize) -> String) -> Vec<WorkItem> {
    (0..n)
        .map(|i| {
            WorkItem::new(
                FeedEntry::new(format!("feed-{i}"), url_for(i)),
                SourceId::new("load.json"),
            )
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn never_more_probes_in_flight_than_the_limit() {
    for limit in [1usize, 3, 8] {
        let transport = Arc::new(
            ScriptedTransport::new().with_latency(Duration::from_millis(10)),
        );
        let checker = LivenessChecker::new(transport.clone())
            .with_concurrency(limit)
            .with_sink(Arc::new(MemorySink::new()));

        let report = checker.run(items(40, |i| format!("http://host/{i}"))).await;

        assert_eq!(report.total, 40);
        assert!(report.is_clean());
        assert!(
            transport.peak_in_flight() <= limit,
            "peak {} exceeded limit {}",
            transport.peak_in_flight(),
            limit
        );
        assert!(transport.peak_in_flight() >= 1);
    }
}

/// Random latency per request so completion order differs from submission order.
struct JitterTransport {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl Transport for JitterTransport {
    async fn get(&self, url: &str) -> Result<u16, TransportError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let delay_ms = rand::rng().random_range(0..15u64);
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if url.ends_with("/odd") {
            Ok(502)
        } else {
            Ok(200)
        }
    }

    fn name(&self) -> &'static str {
        "jitter"
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn results_are_complete_regardless_of_completion_order() {
    let transport = Arc::new(JitterTransport {
        in_flight: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });
    let sink = Arc::new(MemorySink::new());
    let checker = LivenessChecker::new(transport.clone())
        .with_concurrency(6)
        .with_sink(sink.clone());

    let work = items(100, |i| {
        if i % 2 == 1 {
            format!("http://h{i}/odd")
        } else {
            format!("http://h{i}/even")
        }
    });
    let report = checker.run(work).await;

    assert_eq!(report.total, 100);
    assert_eq!(report.succeeded, 50);
    assert_eq!(report.failures.len(), 50);
    assert!(report.failures.iter().all(|f| f.error == "HTTP 502"));
    assert_eq!(sink.snapshot().len(), 100);
    assert!(transport.peak.load(Ordering::SeqCst) <= 6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn hanging_endpoints_time_out_and_the_run_completes() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .route("http://host/0", Scripted::Hang)
            .route("http://host/1", Scripted::Hang),
    );
    let checker = LivenessChecker::new(transport)
        .with_concurrency(2)
        .with_timeout(Duration::from_millis(100));

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        checker.run(items(6, |i| format!("http://host/{i}"))),
    )
    .await
    .expect("run must not hang");

    assert_eq!(report.total, 6);
    assert_eq!(report.failures.len(), 2);
    for f in &report.failures {
        assert_eq!(f.kind, FailureKind::Transport);
        assert!(f.error.contains("timed out"), "got: {}", f.error);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancellation_keeps_finished_outcomes_and_marks_the_rest() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .route("http://host/3", Scripted::Hang)
            .route("http://host/4", Scripted::Hang),
    );
    let checker = LivenessChecker::new(transport.clone())
        .with_concurrency(10)
        .with_timeout(Duration::from_secs(60));

    let report = checker
        .run_until(
            items(5, |i| format!("http://host/{i}")),
            tokio::time::sleep(Duration::from_millis(200)),
        )
        .await;

    assert_eq!(report.total, 5);
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.cancelled(), 2);
    assert_eq!(report.succeeded + report.failures.len(), report.total);
    assert!(report
        .failures
        .iter()
        .all(|f| f.kind == FailureKind::Cancelled && f.error == "cancelled before completion"));
    assert_eq!(transport.calls(), 5);
}

/// Panics on `/boom`, answers 200 everywhere else.
struct PanickingTransport;

#[async_trait]
impl Transport for PanickingTransport {
    async fn get(&self, url: &str) -> Result<u16, TransportError> {
        if url.ends_with("/boom") {
            panic!("transport blew up on {url}");
        }
        Ok(200)
    }

    fn name(&self) -> &'static str {
        "panicking"
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn panicking_task_is_reported_as_transport_failure() {
    let checker = LivenessChecker::new(Arc::new(PanickingTransport))
        .with_concurrency(3)
        .with_sink(Arc::new(MemorySink::new()));

    let work = items(4, |i| {
        if i == 1 {
            "http://host/boom".to_string()
        } else {
            format!("http://host/{i}")
        }
    });
    let report = checker.run(work).await;

    assert_eq!(report.total, 4);
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.succeeded + report.failures.len(), report.total);
    assert_eq!(report.failures.len(), 1);
    let f = &report.failures[0];
    assert_eq!(f.name, "feed-1");
    assert_eq!(f.kind, FailureKind::Transport);
    assert_eq!(f.error, "probe task panicked");
}
