use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Cached yt-dlp binary path
/// Read once at startup from YTDL_BIN environment variable or defaults to "yt-dlp"
pub static YTDL_BIN: Lazy<String> = Lazy::new(|| env::var("YTDL_BIN").unwrap_or_else(|_| "yt-dlp".to_string()));

/// Shared scratch directory for downloaded videos
/// Read from DOWNLOAD_FOLDER environment variable
/// Defaults to `telegramBotVideos` relative to the working directory.
/// Supports tilde (~) expansion for home directory
pub static DOWNLOAD_FOLDER: Lazy<String> =
    Lazy::new(|| env::var("DOWNLOAD_FOLDER").unwrap_or_else(|_| "telegramBotVideos".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "app.log".to_string()));

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Instagram account used by the session-backed downloader
/// Read from INSTAGRAM_USERNAME / INSTAGRAM_PASSWORD environment variables.
/// When unset, Instagram requests fail with a credentials error instead of
/// attempting an anonymous login.
pub static INSTAGRAM_USERNAME: Lazy<String> =
    Lazy::new(|| env::var("INSTAGRAM_USERNAME").unwrap_or_else(|_| String::new()));

pub static INSTAGRAM_PASSWORD: Lazy<String> =
    Lazy::new(|| env::var("INSTAGRAM_PASSWORD").unwrap_or_else(|_| String::new()));

/// GraphQL doc_id for Instagram post queries
/// Read from INSTAGRAM_DOC_ID environment variable (Instagram rotates this
/// value every few weeks; override without redeploying)
pub static INSTAGRAM_DOC_ID: Lazy<String> =
    Lazy::new(|| env::var("INSTAGRAM_DOC_ID").unwrap_or_else(|_| "8845758582119845".to_string()));

/// Download configuration
pub mod download {
    use super::Duration;

    /// Timeout for a single backend fetch (in seconds).
    /// Bounds how long the scratch-directory lock can be held by one request.
    pub const FETCH_TIMEOUT_SECS: u64 = 240;

    /// Backend fetch timeout duration
    pub fn fetch_timeout() -> Duration {
        Duration::from_secs(FETCH_TIMEOUT_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Telegram HTTP requests (in seconds)
    /// Large enough to cover video uploads over slow links.
    pub const REQUEST_TIMEOUT_SECS: u64 = 900;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}
