use thiserror::Error;

/// Instagram login failures.
///
/// `BadCredentials` is fatal for the request: the session is invalidated
/// and no automatic retry happens. `ConnectionFailure` is transient; the
/// next request attempts a fresh login.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Instagram rejected the configured credentials")]
    BadCredentials,
    #[error("could not reach Instagram for login: {0}")]
    ConnectionFailure(String),
}

/// Structured error type for the download pipeline.
///
/// Every backend call is wrapped so that faults from the extraction
/// libraries are converted to one of these variants at the downloader
/// boundary; the dispatch core never lets a raw backend fault escape.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The classifier rejected the input (user-facing, non-retryable)
    #[error("unrecognized URL")]
    InvalidUrl,
    /// Instagram login failed
    #[error("Instagram login failed: {0}")]
    Auth(#[from] AuthError),
    /// Post does not exist or its media is unavailable
    #[error("post not found: {0}")]
    PostNotFound(String),
    /// The backend rejected the request (malformed shortcode, non-video post)
    #[error("bad request: {0}")]
    BadRequest(String),
    /// The post requires an authenticated session (private account, checkpoint)
    #[error("login required: {0}")]
    LoginRequired(String),
    /// Generic extraction backend failure (no stream, geo-block, network)
    #[error("extraction failed: {0}")]
    Extraction(String),
    /// Download reported success but no matching file was located
    #[error("no video file found after download")]
    FileNotFound,
    /// Backend call exceeded the configured timeout
    #[error("download timed out after {0}s")]
    Timeout(u64),
    /// Catch-all for uncategorized backend errors
    #[error("download failed: {0}")]
    Unknown(String),
}

impl DownloadError {
    /// Returns subcategory for logging
    pub fn subcategory(&self) -> &'static str {
        match self {
            DownloadError::InvalidUrl => "invalid_url",
            DownloadError::Auth(AuthError::BadCredentials) => "bad_credentials",
            DownloadError::Auth(AuthError::ConnectionFailure(_)) => "connection_failure",
            DownloadError::PostNotFound(_) => "post_not_found",
            DownloadError::BadRequest(_) => "bad_request",
            DownloadError::LoginRequired(_) => "login_required",
            DownloadError::Extraction(_) => "extraction",
            DownloadError::FileNotFound => "file_not_found",
            DownloadError::Timeout(_) => "timeout",
            DownloadError::Unknown(_) => "unknown",
        }
    }

    /// Human-readable reply for the chat. Each failure kind maps to a
    /// distinct message; none of them leak backend internals beyond the
    /// short extraction reason.
    pub fn user_message(&self) -> String {
        match self {
            DownloadError::InvalidUrl => {
                "❌ That doesn't look like an Instagram, Twitter/X or TikTok link.\n\nSend me a video URL.".to_string()
            }
            DownloadError::Auth(AuthError::BadCredentials) => {
                "❌ Instagram login failed: the configured account credentials were rejected.".to_string()
            }
            DownloadError::Auth(AuthError::ConnectionFailure(_)) => {
                "❌ Could not reach Instagram to log in.\n\nTry again in a minute.".to_string()
            }
            DownloadError::PostNotFound(_) => {
                "❌ Post not found.\n\nIt may have been deleted, or the link is wrong.".to_string()
            }
            DownloadError::BadRequest(_) => "❌ Instagram rejected the request for this post.".to_string(),
            DownloadError::LoginRequired(_) => {
                "❌ This post needs a logged-in session.\n\nIt is probably from a private account.".to_string()
            }
            DownloadError::Extraction(reason) => format!("❌ Could not extract a video from that link.\n\n{}", reason),
            DownloadError::FileNotFound => "❌ The download finished but no video file was produced.".to_string(),
            DownloadError::Timeout(_) => "❌ The download took too long and was cancelled.".to_string(),
            DownloadError::Unknown(_) => "❌ Download failed.\n\nCheck that the link is correct.".to_string(),
        }
    }
}
