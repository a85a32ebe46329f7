//! HTTP transport used to reach the hub.

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use std::future::Future;

use crate::Result;
use crate::request::WireBody;

/// Performs the single network round-trip of a bridge call.
///
/// Implementations return the raw reply body; decoding is the bridge's job.
/// Timeouts and cancellation belong here too, the bridge adds none.
pub trait Transport: Send + Sync {
    /// GET `url` and return the reply body.
    fn send_get(&self, url: &str) -> impl Future<Output = Result<String>> + Send;

    /// POST `body` as JSON to `url` and return the reply body.
    fn send_post(
        &self,
        url: &str,
        body: &WireBody<'_>,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// [`Transport`] backed by a `reqwest` client.
///
/// Non-2xx statuses are reported as [`Error::Transport`](crate::Error::Transport).
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Wrap an already configured `reqwest` client.
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl Transport for HttpTransport {
    async fn send_get(&self, url: &str) -> Result<String> {
        let body = self
            .http
            .get(url)
            .headers(Self::headers())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }

    async fn send_post(&self, url: &str, body: &WireBody<'_>) -> Result<String> {
        let body = self
            .http
            .post(url)
            .headers(Self::headers())
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}
