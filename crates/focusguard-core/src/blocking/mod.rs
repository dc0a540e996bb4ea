//! Site blocking during work sessions.
//!
//! A page is blocked when a work session is active and the page's hostname
//! *contains* the hostname of an active [`BlockedSite`]. The match is a plain
//! substring test: `facebook.com` also blocks `sub.facebook.com`, and a
//! blocked `book.com` blocks `facebook.com` too.

mod monitor;
mod overlay;
mod shared;

pub use monitor::{Frame, NavigationDecision, NavigationEvent, NavigationMonitor, NavigationOutcome, TabStatus};
pub use overlay::{OverlayAction, OverlayController, PageDom, OVERLAY_MARKER};
pub use shared::SharedSessionState;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ValidationError;

/// Internal page that blocked navigations are redirected to.
pub const BLOCKED_PAGE: &str = "blocked.html";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedSite {
    pub id: String,
    pub url: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl BlockedSite {
    /// New active entry with a random id.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            url: url.into(),
            is_active: true,
        }
    }

    /// Hostname of the entry. Entries without a scheme are read as `https://`.
    pub fn hostname(&self) -> Option<String> {
        let raw = self.url.trim();
        if raw.contains("://") {
            hostname_of(raw)
        } else {
            hostname_of(&format!("https://{raw}"))
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.hostname().is_none() {
            return Err(ValidationError::InvalidValue {
                field: "blockedSites.url".into(),
                message: format!("'{}' has no hostname", self.url),
            });
        }
        Ok(())
    }
}

/// Lower-cased hostname of `url`, or `None` if it does not parse or has no host.
pub fn hostname_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.trim_end_matches('.').to_ascii_lowercase();
    (!host.is_empty()).then_some(host)
}

/// Whether `url` matches any active entry of `sites`.
///
/// Ignores whether a work session is running; see [`SharedSessionState`]
/// for the combined check. Unparsable URLs are never blocked.
pub fn matches_block_list(url: &str, sites: &[BlockedSite]) -> bool {
    let Some(visited) = hostname_of(url) else {
        return false;
    };
    sites
        .iter()
        .filter(|site| site.is_active)
        .filter_map(BlockedSite::hostname)
        .any(|blocked| visited.contains(&blocked))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(url: &str, is_active: bool) -> BlockedSite {
        BlockedSite {
            id: url.into(),
            url: url.into(),
            is_active,
        }
    }

    #[test]
    fn subdomains_match_by_substring() {
        let sites = vec![site("https://facebook.com", true)];
        assert!(matches_block_list("https://sub.facebook.com/feed", &sites));
        assert!(matches_block_list("https://facebook.com/", &sites));
        assert!(!matches_block_list("https://example.org/facebook.com", &sites));
    }

    #[test]
    fn substring_match_over_blocks_similar_names() {
        let sites = vec![site("book.com", true)];
        assert!(matches_block_list("https://facebook.com/", &sites));
    }

    #[test]
    fn inactive_sites_are_ignored() {
        let sites = vec![site("https://reddit.com", false)];
        assert!(!matches_block_list("https://reddit.com/r/rust", &sites));
    }

    #[test]
    fn unparsable_urls_are_not_blocked() {
        let sites = vec![site("https://reddit.com", true)];
        assert!(!matches_block_list("not a url", &sites));
        assert!(!matches_block_list("about:blank", &sites));
    }

    #[test]
    fn entries_without_scheme_are_read_as_https() {
        assert_eq!(site("YouTube.com", true).hostname().as_deref(), Some("youtube.com"));
        assert_eq!(
            site("https://www.twitter.com/home", true).hostname().as_deref(),
            Some("www.twitter.com")
        );
    }

    #[test]
    fn validate_requires_a_hostname() {
        assert!(site("news.ycombinator.com", true).validate().is_ok());
        assert!(site("", true).validate().is_err());
        assert!(site("https://", true).validate().is_err());
    }
}
