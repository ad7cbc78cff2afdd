//! Dispatch core: classify, route to a downloader, resolve the output file,
//! clean up after delivery.
//!
//! The scratch directory and the Instagram session are the only shared
//! mutable resources. Both are owned here as explicit lock-protected fields
//! and passed by reference to the downloaders, never module-level
//! singletons. The directory lock is held for the whole
//! prepare → fetch → resolve span, so at most one in-flight download can
//! touch the shared directory's emptied-invariant at a time. Stateless
//! downloads never rely on that invariant and run in parallel freely.

use crate::core::config;
use crate::download::classify::{classify, Platform};
use crate::download::error::DownloadError;
use crate::download::scratch::ScratchDir;
use crate::download::source::{InstagramCredentials, InstagramSession, YtDlpSource};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Owns the downloaders and the shared resources they need.
///
/// Stateless by request: `dispatch(url)` can be called concurrently from
/// independent chat handlers.
pub struct DownloadDispatcher {
    scratch: ScratchDir,
    dir_lock: Mutex<()>,
    instagram: Mutex<InstagramSession>,
    stateless: YtDlpSource,
}

impl DownloadDispatcher {
    pub fn new(scratch: ScratchDir, credentials: InstagramCredentials) -> Self {
        let session = InstagramSession::new(credentials);
        Self::with_session(scratch, session)
    }

    /// Build a dispatcher around a preconstructed session (used by tests to
    /// inject a mock Instagram backend).
    pub fn with_session(scratch: ScratchDir, session: InstagramSession) -> Self {
        let stateless = YtDlpSource::new(scratch.path().to_path_buf());
        Self {
            scratch,
            dir_lock: Mutex::new(()),
            instagram: Mutex::new(session),
            stateless,
        }
    }

    /// Classify the URL, run the matching downloader and resolve the
    /// produced file.
    ///
    /// Unrecognized input returns `InvalidUrl` before any filesystem or
    /// network access. The returned path is an exclusive handle: the caller
    /// must hand it back through `finish` once delivery has been attempted.
    pub async fn dispatch(&self, raw_url: &str) -> Result<PathBuf, DownloadError> {
        match classify(raw_url) {
            Platform::Unknown => Err(DownloadError::InvalidUrl),
            Platform::Instagram => self.dispatch_instagram(raw_url).await,
            Platform::Twitter | Platform::TikTok => self.stateless.fetch(raw_url).await,
        }
    }

    async fn dispatch_instagram(&self, raw_url: &str) -> Result<PathBuf, DownloadError> {
        // Held across prepare → fetch → resolve: a concurrent request must
        // not empty the directory mid-download or resolve our file as its
        // own.
        let _dir_guard = self.dir_lock.lock().await;

        self.scratch.prepare();

        let mut session = self.instagram.lock().await;
        let fetch = session.fetch(raw_url, self.scratch.path());
        match tokio::time::timeout(config::download::fetch_timeout(), fetch).await {
            Ok(result) => {
                result?;
            }
            Err(_) => {
                log::error!("instagram: fetch timed out, releasing directory lock");
                return Err(DownloadError::Timeout(config::download::FETCH_TIMEOUT_SECS));
            }
        }
        drop(session);

        self.scratch.resolve_output(".mp4").ok_or(DownloadError::FileNotFound)
    }

    /// Delete a staged file once the delivery adapter has reported its send
    /// attempt, success or failure alike.
    pub fn finish(&self, path: &Path) {
        self.scratch.delete(path);
    }
}
