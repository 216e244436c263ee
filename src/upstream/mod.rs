//! Upstream fetch subsystem.
//!
//! # Data Flow
//! ```text
//! inbound method + headers, translated feed URL
//!     → headers.rs (forward headers, force Accept-Encoding)
//!     → client.rs (send, decode gzip/deflate, read body)
//!     → UpstreamResponse::NotModified | UpstreamResponse::Fetched
//! ```
//!
//! # Design Decisions
//! - No retries; every failure is reported immediately
//! - Transport deadlines come from the timeout configuration
//! - 304 short-circuits before the body is touched

pub mod client;
pub mod headers;

use thiserror::Error;

pub use client::{FetchedFeed, UpstreamClient, UpstreamResponse};
pub use headers::{forward_headers, FORCED_ACCEPT_ENCODING};

/// Errors talking to the upstream provider.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client itself could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The outbound request could not be constructed.
    #[error("invalid upstream request: {0}")]
    Request(#[source] reqwest::Error),

    /// DNS, connect, TLS, timeout or protocol failure.
    #[error("upstream transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The response body could not be read or decompressed.
    #[error("failed to decode upstream body: {0}")]
    Body(#[source] reqwest::Error),
}

impl FetchError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Client(_) => "client",
            FetchError::Request(_) => "request",
            FetchError::Transport(e) if e.is_timeout() => "timeout",
            FetchError::Transport(_) => "transport",
            FetchError::Body(_) => "body",
        }
    }
}
