//! Session-backed Instagram download source.
//!
//! Unlike the stateless yt-dlp path, Instagram needs an authenticated web
//! session. `InstagramSession` owns the login state machine and drives an
//! `InstagramBackend`. The production `WebApiBackend` talks to Instagram's
//! web login and GraphQL endpoints and streams the post's video into the
//! scratch directory. The backend is a trait so tests can substitute a mock.

use crate::core::config;
use crate::download::error::{AuthError, DownloadError};
use async_trait::async_trait;
use futures_util::StreamExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use url::Url;

/// Instagram web login endpoint.
const LOGIN_ENDPOINT: &str = "https://www.instagram.com/api/v1/web/accounts/login/ajax/";

/// Instagram GraphQL API endpoint.
const GRAPHQL_ENDPOINT: &str = "https://www.instagram.com/api/graphql";

/// Page fetched first to obtain a CSRF cookie.
const HOME_URL: &str = "https://www.instagram.com/";

/// Instagram internal app ID (public, embedded in the web app).
const IG_APP_ID: &str = "936619743392459";

/// Facebook LSD token (anti-CSRF, public static value used by web scrapers).
const FB_LSD_TOKEN: &str = "AVqbxe3J_YA";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Account credentials for the session-backed downloader.
///
/// Loaded from the environment by the excluded config collaborator; the
/// session only consumes them.
#[derive(Debug, Clone)]
pub struct InstagramCredentials {
    pub username: String,
    pub password: String,
}

impl InstagramCredentials {
    /// Read credentials from `INSTAGRAM_USERNAME` / `INSTAGRAM_PASSWORD`.
    pub fn from_env() -> Self {
        Self {
            username: config::INSTAGRAM_USERNAME.clone(),
            password: config::INSTAGRAM_PASSWORD.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_empty() || self.password.is_empty()
    }
}

/// A resolved post, ready to download.
#[derive(Debug, Clone)]
pub struct PostHandle {
    pub shortcode: String,
    pub video_url: String,
}

/// Contract with the Instagram extraction backend.
///
/// `login` distinguishes bad credentials (fatal, no retry) from connection
/// failures (transient). `fetch_post` resolves a shortcode to a downloadable
/// video; `download_post` writes the media into the target directory.
#[async_trait]
pub trait InstagramBackend: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<(), AuthError>;
    async fn fetch_post(&self, shortcode: &str) -> Result<PostHandle, DownloadError>;
    async fn download_post(&self, post: &PostHandle, target_dir: &Path) -> Result<PathBuf, DownloadError>;
}

/// Login state of the shared session. The transient authenticating and
/// fetching phases live across the await points of `fetch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Unauthenticated,
    Authenticated,
}

/// Shared authenticated Instagram session.
///
/// Created once per process, logs in lazily on the first Instagram request
/// and keeps the session for reuse. A rejected login leaves the session
/// unauthenticated so the next request starts from a fresh login.
pub struct InstagramSession {
    backend: Box<dyn InstagramBackend>,
    credentials: InstagramCredentials,
    state: SessionState,
}

impl InstagramSession {
    pub fn new(credentials: InstagramCredentials) -> Self {
        Self::with_backend(Box::new(WebApiBackend::new()), credentials)
    }

    /// Build a session over a custom backend (used by tests).
    pub fn with_backend(backend: Box<dyn InstagramBackend>, credentials: InstagramCredentials) -> Self {
        Self {
            backend,
            credentials,
            state: SessionState::Unauthenticated,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    /// Fetch one post's video into `target_dir`.
    ///
    /// Logs in first if the session is not yet authenticated. All backend
    /// failures come back as classified `DownloadError`s; nothing panics.
    pub async fn fetch(&mut self, raw_url: &str, target_dir: &Path) -> Result<PathBuf, DownloadError> {
        self.ensure_authenticated().await?;

        let shortcode = extract_shortcode(raw_url)?;
        log::info!("instagram: fetching post {}", shortcode);

        let post = self.backend.fetch_post(&shortcode).await.map_err(|e| {
            log::warn!("instagram: failed to resolve post {}: {}", shortcode, e);
            e
        })?;

        self.backend.download_post(&post, target_dir).await.map_err(|e| {
            log::warn!("instagram: failed to download post {}: {}", shortcode, e);
            e
        })
    }

    async fn ensure_authenticated(&mut self) -> Result<(), DownloadError> {
        if self.state == SessionState::Authenticated {
            return Ok(());
        }

        if self.credentials.is_empty() {
            log::error!("instagram: no credentials configured, refusing to log in");
            return Err(AuthError::BadCredentials.into());
        }

        log::info!("instagram: logging in as {}", self.credentials.username);
        match self
            .backend
            .login(&self.credentials.username, &self.credentials.password)
            .await
        {
            Ok(()) => {
                log::info!("instagram: login successful, session retained");
                self.state = SessionState::Authenticated;
                Ok(())
            }
            Err(e) => {
                log::error!("instagram: login failed: {}", e);
                self.state = SessionState::Unauthenticated;
                Err(e.into())
            }
        }
    }
}

/// Extract the post's shortcode: the last of the non-empty path segments,
/// of which there must be at least two (`/p/<code>/`, `/reel/<code>/`).
///
/// A URL with fewer segments has no well-defined shortcode and is rejected
/// as an input error instead of faulting.
pub fn extract_shortcode(raw_url: &str) -> Result<String, DownloadError> {
    let url = Url::parse(raw_url).map_err(|_| DownloadError::InvalidUrl)?;
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();

    if segments.len() < 2 {
        return Err(DownloadError::InvalidUrl);
    }

    Ok(segments[segments.len() - 1].to_string())
}

/// Production backend over Instagram's web API.
///
/// One `reqwest` client with a cookie store: the session cookie set by a
/// successful login authenticates the subsequent GraphQL and media requests.
pub struct WebApiBackend {
    client: reqwest::Client,
}

impl Default for WebApiBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl WebApiBackend {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .timeout(std::time::Duration::from_secs(60))
            .connect_timeout(std::time::Duration::from_secs(15))
            .build()
            .expect("Instagram HTTP client build should succeed");

        Self { client }
    }

    /// Obtain a fresh CSRF token by loading the home page.
    async fn fetch_csrf_token(&self) -> Result<String, AuthError> {
        let response = self
            .client
            .get(HOME_URL)
            .send()
            .await
            .map_err(|e| AuthError::ConnectionFailure(format!("failed to load login page: {}", e)))?;

        let token = response
            .cookies()
            .find(|c| c.name() == "csrftoken")
            .map(|c| c.value().to_string())
            .ok_or_else(|| AuthError::ConnectionFailure("no csrftoken cookie in login page response".to_string()));
        token
    }
}

#[async_trait]
impl InstagramBackend for WebApiBackend {
    async fn login(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let csrf_token = self.fetch_csrf_token().await?;

        // Browser-style password envelope; timestamp is part of the format
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let enc_password = format!("#PWD_INSTAGRAM_BROWSER:0:{}:{}", timestamp, password);

        let form = [("username", username), ("enc_password", enc_password.as_str())];
        let response = self
            .client
            .post(LOGIN_ENDPOINT)
            .header("X-CSRFToken", &csrf_token)
            .header("X-IG-App-ID", IG_APP_ID)
            .header("X-Requested-With", "XMLHttpRequest")
            .header("Referer", HOME_URL)
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::ConnectionFailure(format!("login request failed: {}", e)))?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AuthError::ConnectionFailure(format!("login returned non-JSON (HTTP {}): {}", status, e)))?;

        if body.get("authenticated").and_then(|v| v.as_bool()).unwrap_or(false) {
            return Ok(());
        }

        // "authenticated": false with "user": true means the password was
        // wrong; anything else (checkpoint, rate limit, missing fields) is
        // reported as a connection-level failure.
        if body.get("authenticated").and_then(|v| v.as_bool()) == Some(false) {
            return Err(AuthError::BadCredentials);
        }

        let message = body
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("unexpected login response");
        Err(AuthError::ConnectionFailure(format!("HTTP {}: {}", status, message)))
    }

    async fn fetch_post(&self, shortcode: &str) -> Result<PostHandle, DownloadError> {
        let variables = format!(r#"{{"shortcode":"{}"}}"#, shortcode);
        let body = format!(
            "doc_id={}&variables={}&lsd={}",
            config::INSTAGRAM_DOC_ID.as_str(),
            urlencoding::encode(&variables),
            FB_LSD_TOKEN
        );

        let response = self
            .client
            .post(GRAPHQL_ENDPOINT)
            .header("X-IG-App-ID", IG_APP_ID)
            .header("X-FB-LSD", FB_LSD_TOKEN)
            .header("X-Requested-With", "XMLHttpRequest")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Referer", HOME_URL)
            .body(body)
            .send()
            .await
            .map_err(|e| DownloadError::Unknown(format!("GraphQL request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST {
            return Err(DownloadError::BadRequest(format!(
                "GraphQL rejected shortcode {}",
                shortcode
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| DownloadError::Unknown(format!("failed to read GraphQL response: {}", e)))?;
        let body: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
            log::error!(
                "instagram: GraphQL returned non-JSON ({}): {}",
                e,
                text.chars().take(300).collect::<String>()
            );
            DownloadError::Unknown(format!("failed to parse GraphQL response: {}", e))
        })?;

        if let Some(message) = body.get("message").and_then(|v| v.as_str()) {
            if message.contains("login_required") || message.contains("checkpoint_required") {
                return Err(DownloadError::LoginRequired(message.to_string()));
            }
        }

        let media = body
            .pointer("/data/xdt_shortcode_media")
            .or_else(|| body.pointer("/data/shortcode_media"))
            .ok_or_else(|| DownloadError::PostNotFound(format!("no media for shortcode {}", shortcode)))?;

        let is_video = media.get("is_video").and_then(|v| v.as_bool()).unwrap_or(false);
        let video_url = media.get("video_url").and_then(|v| v.as_str());

        match (is_video, video_url) {
            (true, Some(url)) => Ok(PostHandle {
                shortcode: shortcode.to_string(),
                video_url: url.to_string(),
            }),
            _ => Err(DownloadError::BadRequest(format!(
                "post {} has no video stream",
                shortcode
            ))),
        }
    }

    async fn download_post(&self, post: &PostHandle, target_dir: &Path) -> Result<PathBuf, DownloadError> {
        let response = self
            .client
            .get(&post.video_url)
            .send()
            .await
            .map_err(|e| DownloadError::Unknown(format!("failed to download media: {}", e)))?;

        if !response.status().is_success() {
            return Err(DownloadError::Unknown(format!(
                "media download HTTP {}",
                response.status()
            )));
        }

        std::fs::create_dir_all(target_dir)
            .map_err(|e| DownloadError::Unknown(format!("failed to create directory: {}", e)))?;
        let output_path = target_dir.join(format!("{}.mp4", post.shortcode));
        let mut file = std::fs::File::create(&output_path)
            .map_err(|e| DownloadError::Unknown(format!("failed to create file: {}", e)))?;

        let mut stream = response.bytes_stream();
        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| DownloadError::Unknown(format!("error reading chunk: {}", e)))?;
            file.write_all(&chunk)
                .map_err(|e| DownloadError::Unknown(format!("error writing to file: {}", e)))?;
        }

        file.flush()
            .map_err(|e| DownloadError::Unknown(format!("failed to flush file: {}", e)))?;

        log::info!("instagram: wrote {}", output_path.display());
        Ok(output_path)
    }
}
