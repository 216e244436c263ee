//! Outbound request header preparation.
//!
//! # Responsibilities
//! - Copy inbound headers to the upstream request, value by value
//! - Strip hop-by-hop and connection-specific headers
//! - Force the compression negotiation
//!
//! # Design Decisions
//! - The inbound Accept-Encoding is never honoured; the client decodes
//!   gzip/deflate itself and the caller always receives identity bodies

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

/// Compression negotiation sent on every upstream request.
pub const FORCED_ACCEPT_ENCODING: &str = "gzip, deflate";

/// Headers that belong to the inbound connection and are never forwarded.
const CONNECTION_HEADERS: [HeaderName; 9] = [
    header::HOST,
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::CONTENT_LENGTH,
];

/// Build the upstream request headers from the inbound ones.
pub fn forward_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut outbound = HeaderMap::with_capacity(inbound.len() + 1);
    for (name, value) in inbound {
        if *name == header::ACCEPT_ENCODING || CONNECTION_HEADERS.contains(name) {
            continue;
        }
        outbound.append(name.clone(), value.clone());
    }
    outbound.insert(
        header::ACCEPT_ENCODING,
        HeaderValue::from_static(FORCED_ACCEPT_ENCODING),
    );
    outbound
}
