//! Response handling and transformation.
//!
//! # Responsibilities
//! - Copy the allow-listed upstream headers to the client response
//! - Map pipeline failures to a bare 500
//!
//! # Design Decisions
//! - Error details go to the log, never into the response body
//! - Headers missing from the allow-list are dropped silently

use axum::http::header::{self, HeaderMap, HeaderName};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::rewrite::FeedError;
use crate::upstream::FetchError;

/// Upstream response headers passed on to the client, in copy order.
pub const FORWARDED_RESPONSE_HEADERS: [HeaderName; 10] = [
    // Cache control headers
    header::AGE,
    header::CACHE_CONTROL,
    header::CONTENT_TYPE,
    header::DATE,
    header::ETAG,
    header::LAST_MODIFIED,
    header::VARY,
    // Provider-specific
    HeaderName::from_static("pinterest-breed"),
    HeaderName::from_static("pinterest-generated-by"),
    HeaderName::from_static("pinterest-version"),
];

/// Copy the first non-empty value of each allow-listed header.
pub fn copy_headers(upstream: &HeaderMap, allow_list: &[HeaderName]) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(allow_list.len());
    for name in allow_list {
        if let Some(value) = upstream.get(name).filter(|v| !v.is_empty()) {
            headers.insert(name.clone(), value.clone());
        }
    }
    headers
}

/// Anything that ends a feed request with a server error.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("invalid upstream url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Feed(#[from] FeedError),
}

impl ProxyError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::InvalidUrl { .. } => "url",
            ProxyError::Fetch(e) => e.kind(),
            ProxyError::Feed(_) => "feed",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_only_allow_listed_headers_copied() {
        let mut upstream = HeaderMap::new();
        upstream.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/rss+xml"));
        upstream.insert(header::ETAG, HeaderValue::from_static("\"v1\""));
        upstream.insert("pinterest-version", HeaderValue::from_static("abc123"));
        upstream.insert(header::SET_COOKIE, HeaderValue::from_static("csrftoken=x"));
        upstream.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));

        let headers = copy_headers(&upstream, &FORWARDED_RESPONSE_HEADERS);
        assert_eq!(headers.len(), 3);
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "application/rss+xml");
        assert_eq!(headers.get(header::ETAG).unwrap(), "\"v1\"");
        assert_eq!(headers.get("Pinterest-Version").unwrap(), "abc123");
        assert!(headers.get(header::SET_COOKIE).is_none());
        assert!(headers.get(header::CONTENT_ENCODING).is_none());
    }

    #[test]
    fn test_empty_values_skipped() {
        let mut upstream = HeaderMap::new();
        upstream.insert(header::VARY, HeaderValue::from_static(""));
        upstream.insert(header::AGE, HeaderValue::from_static("12"));

        let headers = copy_headers(&upstream, &FORWARDED_RESPONSE_HEADERS);
        assert!(headers.get(header::VARY).is_none());
        assert_eq!(headers.get(header::AGE).unwrap(), "12");
    }

    #[test]
    fn test_first_value_wins() {
        let mut upstream = HeaderMap::new();
        upstream.append(header::CACHE_CONTROL, HeaderValue::from_static("max-age=60"));
        upstream.append(header::CACHE_CONTROL, HeaderValue::from_static("public"));

        let headers = copy_headers(&upstream, &FORWARDED_RESPONSE_HEADERS);
        let values: Vec<_> = headers.get_all(header::CACHE_CONTROL).iter().collect();
        assert_eq!(values, vec!["max-age=60"]);
    }

    #[test]
    fn test_error_renders_bare_500() {
        let response = ProxyError::Feed(FeedError::NoItems).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }
}
