//! HTTP client for the upstream feed provider.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use url::Url;

use crate::config::TimeoutConfig;
use crate::upstream::headers::forward_headers;
use crate::upstream::FetchError;

/// Outcome of one upstream request.
#[derive(Debug)]
pub enum UpstreamResponse {
    /// The conditional request matched; nothing was read.
    NotModified,
    /// A full response, body already decoded.
    Fetched(FetchedFeed),
}

/// A fully read upstream response.
#[derive(Debug)]
pub struct FetchedFeed {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Client for the single upstream origin.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    /// Build a client enforcing the configured deadlines.
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.request_secs))
            .gzip(true)
            .deflate(true)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    /// Issue `method url` carrying the forwarded inbound headers.
    ///
    /// The response is dropped, and its connection released, on every path
    /// out of this function.
    pub async fn fetch(
        &self,
        method: Method,
        url: Url,
        inbound: &HeaderMap,
    ) -> Result<UpstreamResponse, FetchError> {
        let request = self
            .client
            .request(method, url)
            .headers(forward_headers(inbound))
            .build()
            .map_err(FetchError::Request)?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if status == StatusCode::NOT_MODIFIED {
            tracing::debug!("Upstream reported not modified");
            return Ok(UpstreamResponse::NotModified);
        }

        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(FetchError::Body)?;

        tracing::debug!(status = %status, bytes = body.len(), "Upstream response read");
        Ok(UpstreamResponse::Fetched(FetchedFeed { status, headers, body }))
    }
}
