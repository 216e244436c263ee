//! Thumbnail URL upgrade.
//!
//! Rewrites the resolution token of pinimg.com JPEG URLs found anywhere in
//! the raw feed body, e.g. `https://i.pinimg.com/236x/ab/cd.jpg` becomes
//! `https://i.pinimg.com/1200x/ab/cd.jpg`.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::bytes::Regex;

static THUMBNAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(https?://[0-9a-z-]+\.pinimg\.com/)(\d+x)(/[/0-9a-f]+\.jpg)\b")
        .expect("Invalid thumbnail pattern")
});

/// Replaces the resolution segment of every thumbnail URL.
#[derive(Debug, Clone)]
pub struct ThumbnailRewriter {
    replacement: String,
}

impl ThumbnailRewriter {
    /// Rewriter producing `<size>x` URLs.
    pub fn new(size: u32) -> Self {
        Self {
            replacement: format!("${{1}}{size}x${{3}}"),
        }
    }

    /// Rewrite all matches; borrows the input when nothing matched.
    pub fn rewrite<'a>(&self, body: &'a [u8]) -> Cow<'a, [u8]> {
        THUMBNAIL_PATTERN.replace_all(body, self.replacement.as_bytes())
    }
}

impl Default for ThumbnailRewriter {
    fn default() -> Self {
        Self::new(1200)
    }
}
