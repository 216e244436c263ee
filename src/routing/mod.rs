//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → "/"            → permanent redirect to the project page
//!     → "/<u>[/<f>]"   → feed_path.rs (username, feed name)
//!                      → upstream feed URL
//! ```
//!
//! # Design Decisions
//! - Single fixed upstream origin; no route table
//! - Deterministic: same path always yields the same URL

pub mod feed_path;

pub use feed_path::{feed_url, FeedAddress, DEFAULT_FEED, FEED_SUFFIX};
