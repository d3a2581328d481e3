// src/probe/fake.rs
//! Deterministic transport for tests and dry runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{Transport, TransportError};

/// What a scripted URL answers with.
#[derive(Debug, Clone)]
pub enum Scripted {
    Status(u16),
    Fail(String),
    /// Never answers; only the caller's timeout ends the probe.
    Hang,
}

/// Answers from a fixed URL table and counts concurrent callers.
pub struct ScriptedTransport {
    routes: HashMap<String, Scripted>,
    fallback: Scripted,
    latency: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            fallback: Scripted::Status(200),
            latency: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn route(mut self, url: impl Into<String>, answer: Scripted) -> Self {
        self.routes.insert(url.into(), answer);
        self
    }

    /// Answer for URLs without an explicit route (defaults to 200).
    pub fn fallback(mut self, answer: Scripted) -> Self {
        self.fallback = answer;
        self
    }

    /// Fixed delay before every answer, so that probes overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Highest number of simultaneous `get` calls observed.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<u16, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        // Decrements on completion and on cancellation by timeout/abort.
        let _guard = InFlight(&self.in_flight);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match self.routes.get(url).unwrap_or(&self.fallback) {
            Scripted::Status(code) => Ok(*code),
            Scripted::Fail(msg) => Err(TransportError::new(msg.clone())),
            Scripted::Hang => std::future::pending().await,
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
