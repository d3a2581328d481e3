// src/probe/mod.rs
//! Probe primitives: the transport seam and outcome classification.
//!
//! Classification rule: status exactly 200 is success, any other status is an
//! HTTP failure, anything that prevents a status from arriving is a transport
//! failure.

pub mod fake;
pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use fake::{Scripted, ScriptedTransport};
pub use http::HttpTransport;

/// Identification sent with every probe; some feed hosts reject anonymous clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 RSS Bot";

/// Outcome of exactly one probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeOutcome {
    Success,
    HttpFailure(u16),
    TransportFailure(String),
}

impl ProbeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success)
    }

    /// Human readable error, `None` for success.
    pub fn description(&self) -> Option<String> {
        match self {
            ProbeOutcome::Success => None,
            ProbeOutcome::HttpFailure(code) => Some(format!("HTTP {code}")),
            ProbeOutcome::TransportFailure(msg) => Some(msg.clone()),
        }
    }
}

/// Anything that kept a probe from receiving a status code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            "transport error".to_string()
        } else {
            message
        };
        Self { message }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        // `{:#}` renders the whole source chain ("error sending request ...: dns error: ...").
        Self::new(format!("{:#}", anyhow::Error::new(e)))
    }
}

/// Network seam of the checker. One call is one GET; the return value is the
/// final status code after the transport's redirect handling.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<u16, TransportError>;
    /// Short label used on run log lines.
    fn name(&self) -> &'static str;
}

pub fn classify(result: Result<u16, TransportError>) -> ProbeOutcome {
    match result {
        Ok(200) => ProbeOutcome::Success,
        Ok(code) => ProbeOutcome::HttpFailure(code),
        Err(e) => ProbeOutcome::TransportFailure(e.message().to_string()),
    }
}
