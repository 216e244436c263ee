//! Pinterest feed proxy library.
//!
//! Fetches a user or board RSS feed from the upstream provider, upgrades
//! thumbnail URLs to a larger resolution, restores full item titles from
//! the item descriptions and returns the result with a curated subset of
//! the upstream headers.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rewrite;
pub mod routing;
pub mod upstream;

pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
