//! URL classification for inbound messages.
//!
//! Pure substring matching in a fixed priority order: Instagram first, then
//! Twitter/X, then TikTok. A URL containing several platform substrings is
//! classified by the first matching rule; deliberate precedence, not an
//! error.

use std::fmt;

/// Platform a URL belongs to, as far as the classifier can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Instagram,
    Twitter,
    TikTok,
    Unknown,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Instagram => write!(f, "Instagram"),
            Platform::Twitter => write!(f, "Twitter/X"),
            Platform::TikTok => write!(f, "TikTok"),
            Platform::Unknown => write!(f, "unrecognized"),
        }
    }
}

/// Classify a raw message string. Total: never fails, no network access.
pub fn classify(raw_url: &str) -> Platform {
    if raw_url.contains("instagram.com") {
        Platform::Instagram
    } else if raw_url.contains("twitter.com") || raw_url.contains("x.com") {
        Platform::Twitter
    } else if raw_url.contains("tiktok.com") {
        Platform::TikTok
    } else {
        Platform::Unknown
    }
}
