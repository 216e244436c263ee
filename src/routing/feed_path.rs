//! Inbound path → upstream feed URL translation.
//!
//! # Responsibilities
//! - Strip an optional `.rss` suffix
//! - Extract username and feed name from the first two path segments
//! - Build the upstream feed URL by plain concatenation
//!
//! # Design Decisions
//! - No validation or escaping of segments; the upstream accepts raw segments
//! - Segments past the second are ignored

/// Suffix accepted (and ignored) on inbound feed paths.
pub const FEED_SUFFIX: &str = ".rss";

/// Feed name used when the path names a user only.
pub const DEFAULT_FEED: &str = "feed";

/// Username and feed name derived from an inbound path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedAddress {
    pub username: String,
    pub feed_name: String,
}

impl FeedAddress {
    /// Split `/<username>/<feed>[/...][.rss]` into its parts.
    ///
    /// Missing segments come back empty; `feed_name` is left empty too, so
    /// callers can tell "no feed given" from an explicit `feed`.
    pub fn from_path(path: &str) -> Self {
        let path = path.strip_suffix(FEED_SUFFIX).unwrap_or(path);
        let mut parts = path.splitn(4, '/').skip(1);
        let username = parts.next().unwrap_or_default().to_string();
        let feed_name = parts.next().unwrap_or_default().to_string();
        Self { username, feed_name }
    }

    /// Feed name with the default applied.
    pub fn feed_or_default(&self) -> &str {
        if self.feed_name.is_empty() {
            DEFAULT_FEED
        } else {
            &self.feed_name
        }
    }

    /// Upstream URL for this address under `origin`.
    pub fn upstream_url(&self, origin: &str) -> String {
        format!(
            "{}/{}/{}{}",
            origin.trim_end_matches('/'),
            self.username,
            self.feed_or_default(),
            FEED_SUFFIX
        )
    }
}

/// Translate an inbound request path into the upstream feed URL.
pub fn feed_url(origin: &str, path: &str) -> String {
    FeedAddress::from_path(path).upstream_url(origin)
}
