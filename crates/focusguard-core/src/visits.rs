//! Visit logging and URL categorization.
//!
//! The tracker remembers the page the user is on. When navigation moves to
//! a different URL, the time spent on the previous page becomes a
//! [`VisitRecord`], provided it lasted more than 0 and less than
//! [`MAX_VISIT_SECS`] seconds. Anything outside that window is a clock
//! anomaly or an idle tab.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Visits of this length or longer are discarded.
pub const MAX_VISIT_SECS: i64 = 1800;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Email,
    Social,
    Entertainment,
    News,
    Shopping,
    Development,
    Productivity,
    Search,
    Other,
    Unknown,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Email => "email",
            Category::Social => "social",
            Category::Entertainment => "entertainment",
            Category::News => "news",
            Category::Shopping => "shopping",
            Category::Development => "development",
            Category::Productivity => "productivity",
            Category::Search => "search",
            Category::Other => "other",
            Category::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "email" => Category::Email,
            "social" => Category::Social,
            "entertainment" => Category::Entertainment,
            "news" => Category::News,
            "shopping" => Category::Shopping,
            "development" => Category::Development,
            "productivity" => Category::Productivity,
            "search" => Category::Search,
            "other" => Category::Other,
            "unknown" => Category::Unknown,
            other => return Err(format!("unknown category: {other}")),
        })
    }
}

// Order is irrelevant: lookup tries the exact host before parent domains.
const DOMAIN_CATEGORIES: &[(&str, Category)] = &[
    ("mail.google.com", Category::Email),
    ("gmail.com", Category::Email),
    ("outlook.com", Category::Email),
    ("outlook.live.com", Category::Email),
    ("mail.yahoo.com", Category::Email),
    ("proton.me", Category::Email),
    ("protonmail.com", Category::Email),
    ("facebook.com", Category::Social),
    ("twitter.com", Category::Social),
    ("x.com", Category::Social),
    ("instagram.com", Category::Social),
    ("linkedin.com", Category::Social),
    ("reddit.com", Category::Social),
    ("tiktok.com", Category::Social),
    ("pinterest.com", Category::Social),
    ("youtube.com", Category::Entertainment),
    ("netflix.com", Category::Entertainment),
    ("twitch.tv", Category::Entertainment),
    ("spotify.com", Category::Entertainment),
    ("disneyplus.com", Category::Entertainment),
    ("news.google.com", Category::News),
    ("news.ycombinator.com", Category::News),
    ("cnn.com", Category::News),
    ("bbc.com", Category::News),
    ("bbc.co.uk", Category::News),
    ("nytimes.com", Category::News),
    ("theguardian.com", Category::News),
    ("amazon.com", Category::Shopping),
    ("ebay.com", Category::Shopping),
    ("etsy.com", Category::Shopping),
    ("github.com", Category::Development),
    ("gitlab.com", Category::Development),
    ("stackoverflow.com", Category::Development),
    ("developer.mozilla.org", Category::Development),
    ("docs.rs", Category::Development),
    ("crates.io", Category::Development),
    ("docs.google.com", Category::Productivity),
    ("drive.google.com", Category::Productivity),
    ("calendar.google.com", Category::Productivity),
    ("notion.so", Category::Productivity),
    ("trello.com", Category::Productivity),
    ("slack.com", Category::Productivity),
    ("google.com", Category::Search),
    ("bing.com", Category::Search),
    ("duckduckgo.com", Category::Search),
];

/// Category of `url` from the static domain table.
///
/// Tries the exact host (without `www.`), then each parent domain.
/// Unlisted hosts are `Other`; URLs that don't parse or have no host are
/// `Unknown`.
pub fn categorize_url(url: &str) -> Category {
    let Ok(parsed) = Url::parse(url) else {
        return Category::Unknown;
    };
    let Some(host) = parsed.host_str() else {
        return Category::Unknown;
    };
    let host = host.to_ascii_lowercase();
    let mut candidate = host.strip_prefix("www.").unwrap_or(&host);

    loop {
        if let Some((_, category)) = DOMAIN_CATEGORIES.iter().find(|(d, _)| *d == candidate) {
            return *category;
        }
        match candidate.split_once('.') {
            Some((_, parent)) if parent.contains('.') => candidate = parent,
            _ => return Category::Other,
        }
    }
}

/// One finished page visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRecord {
    pub url: String,
    pub title: String,
    pub category: Category,
    pub duration_secs: u64,
    /// When the visit began.
    pub visited_at: DateTime<Utc>,
}

/// `lastVisitedUrl/Title/Time` bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastVisit {
    pub url: String,
    pub title: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitTracker {
    last: Option<LastVisit>,
}

impl VisitTracker {
    pub fn last_visit(&self) -> Option<&LastVisit> {
        self.last.as_ref()
    }

    /// Note a completed navigation to `url` at `at`.
    ///
    /// Returns the previous page's visit if it should be recorded.
    /// Reloads of the same URL keep the original start time.
    pub fn on_navigation(&mut self, url: &str, title: &str, at: DateTime<Utc>) -> Option<VisitRecord> {
        if let Some(last) = self.last.as_mut() {
            if last.url == url {
                if !title.is_empty() {
                    last.title = title.to_string();
                }
                return None;
            }
        }

        let previous = self.last.replace(LastVisit {
            url: url.to_string(),
            title: title.to_string(),
            started_at: at,
        })?;

        let elapsed = (at - previous.started_at).num_seconds();
        if elapsed <= 0 || elapsed >= MAX_VISIT_SECS {
            tracing::debug!(url = %previous.url, elapsed, "visit discarded");
            return None;
        }

        Some(VisitRecord {
            category: categorize_url(&previous.url),
            url: previous.url,
            title: previous.title,
            duration_secs: elapsed.unsigned_abs(),
            visited_at: previous.started_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn categorizes_known_domains() {
        assert_eq!(categorize_url("https://mail.google.com/x"), Category::Email);
        assert_eq!(categorize_url("https://www.github.com/rust-lang"), Category::Development);
        assert_eq!(categorize_url("https://old.reddit.com/r/rust"), Category::Social);
        assert_eq!(categorize_url("https://maps.google.com/"), Category::Search);
    }

    #[test]
    fn unlisted_and_unparsable() {
        assert_eq!(categorize_url("https://example.org/"), Category::Other);
        assert_eq!(categorize_url("not a url"), Category::Unknown);
        assert_eq!(categorize_url("about:blank"), Category::Unknown);
    }

    #[test]
    fn one_second_visit_is_recorded() {
        let mut tracker = VisitTracker::default();
        let t0 = Utc::now();
        tracker.on_navigation("https://github.com/", "GitHub", t0);
        let visit = tracker
            .on_navigation("https://docs.rs/", "Docs.rs", t0 + Duration::seconds(1))
            .unwrap();
        assert_eq!(visit.duration_secs, 1);
        assert_eq!(visit.title, "GitHub");
        assert_eq!(visit.category, Category::Development);
        assert_eq!(visit.visited_at, t0);
    }

    #[test]
    fn long_and_non_positive_visits_are_dropped() {
        let mut tracker = VisitTracker::default();
        let t0 = Utc::now();
        tracker.on_navigation("https://a.example/", "", t0);
        assert!(tracker
            .on_navigation("https://b.example/", "", t0 + Duration::seconds(1801))
            .is_none());
        assert!(tracker
            .on_navigation("https://c.example/", "", t0 + Duration::seconds(1801))
            .is_none());
        assert!(tracker
            .on_navigation("https://d.example/", "", t0 + Duration::seconds(1700))
            .is_none());
        assert_eq!(tracker.last_visit().unwrap().url, "https://d.example/");
    }

    #[test]
    fn exactly_1800_seconds_is_dropped() {
        let mut tracker = VisitTracker::default();
        let t0 = Utc::now();
        tracker.on_navigation("https://a.example/", "", t0);
        assert!(tracker
            .on_navigation("https://b.example/", "", t0 + Duration::seconds(1800))
            .is_none());
    }

    #[test]
    fn same_url_keeps_the_original_start() {
        let mut tracker = VisitTracker::default();
        let t0 = Utc::now();
        tracker.on_navigation("https://a.example/", "", t0);
        assert!(tracker
            .on_navigation("https://a.example/", "A", t0 + Duration::seconds(5))
            .is_none());
        let visit = tracker
            .on_navigation("https://b.example/", "", t0 + Duration::seconds(10))
            .unwrap();
        assert_eq!(visit.duration_secs, 10);
        assert_eq!(visit.title, "A");
    }
}
