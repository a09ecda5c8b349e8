//! HTTP-backed probe for candidate background URLs.
//!
//! A thin adapter over `reqwest` for callers that want a working network
//! probe without writing one: a candidate counts as found when a GET
//! answers with a success status. The per-request client timeout is a
//! backstop; the resolver applies its own per-probe bound on top.

use std::time::Duration;

use futures::future::BoxFuture;

use crate::background::UrlProbe;
use crate::error::{Error, Result};

pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout_ms: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl UrlProbe for HttpProbe {
    fn probe<'a>(&'a self, url: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            match self.client.get(url).send().await {
                Ok(resp) => resp.status().is_success(),
                Err(_) => false,
            }
        })
    }

    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Option<Vec<u8>>> {
        Box::pin(async move {
            let resp = self.client.get(url).send().await.ok()?;
            if !resp.status().is_success() {
                return None;
            }
            resp.bytes().await.ok().map(|b| b.to_vec())
        })
    }
}
