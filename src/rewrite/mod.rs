//! Feed rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! decoded upstream body
//!     → thumbnails.rs (regex substitution over raw bytes)
//!     → titles.rs (streaming XML scan, splice item titles)
//!     → rewritten feed document
//! ```
//!
//! # Design Decisions
//! - Patterns are compiled once per process and never mutated
//! - Untouched regions of the document are copied byte-for-byte
//! - "No full title" is a value (`None`); a malformed document is an error

pub mod thumbnails;
pub mod titles;

use thiserror::Error;

use crate::config::RewriteConfig;

pub use thumbnails::ThumbnailRewriter;
pub use titles::{full_title, FeedLayout, ItemSpan, Reconstructed, TitleReconstructor};

/// Structural problems with a feed document.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("malformed feed at byte {position}: {source}")]
    Malformed {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    #[error("feed has no <rss><channel> element")]
    MissingChannel,

    #[error("feed ends before </channel></rss>")]
    Truncated,

    #[error("feed channel has no <item> elements")]
    NoItems,
}

/// Both rewrite stages, in order.
#[derive(Debug, Clone)]
pub struct FeedRewriter {
    thumbnails: ThumbnailRewriter,
    titles: TitleReconstructor,
}

impl FeedRewriter {
    pub fn new(config: &RewriteConfig) -> Self {
        Self {
            thumbnails: ThumbnailRewriter::new(config.thumbnail_size),
            titles: TitleReconstructor::new(config.missing_title),
        }
    }

    /// Upgrade thumbnails, then reconstruct titles.
    pub fn rewrite(&self, body: &[u8]) -> Result<Reconstructed, FeedError> {
        let body = self.thumbnails.rewrite(body);
        self.titles.reconstruct(&body)
    }
}
