// src/probe/http.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use super::{Transport, TransportError};

/// Real transport backed by a shared `reqwest::Client`.
///
/// Redirects follow reqwest's default policy (up to 10 hops); the status of
/// the final response is what gets classified.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .context("building probe http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<u16, TransportError> {
        let resp = self.client.get(url).send().await?;
        // Body is never read; dropping the response closes the stream.
        Ok(resp.status().as_u16())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
