//! Integration tests for the dispatch core.
//!
//! The Instagram backend is mocked at the `InstagramBackend` seam so the
//! full classify → prepare → fetch → resolve → finish lifecycle runs against
//! a real scratch directory without network access.
//!
//! Run with: cargo test --test dispatch_test

use async_trait::async_trait;
use cliprelay::download::error::{AuthError, DownloadError};
use cliprelay::download::source::{InstagramBackend, InstagramCredentials, InstagramSession, PostHandle};
use cliprelay::download::{DownloadDispatcher, ScratchDir};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// What the fake backend should do on `download_post`.
#[derive(Clone, Copy)]
enum DownloadBehavior {
    /// Write `<shortcode>.mp4` into the target directory.
    WriteVideo,
    /// Report success but write nothing.
    WriteNothing,
}

struct FakeBackend {
    login_calls: Arc<AtomicUsize>,
    fetch_calls: Arc<AtomicUsize>,
    login_result: Option<fn() -> AuthError>,
    behavior: DownloadBehavior,
    /// Simulated network latency inside `download_post`.
    delay: Duration,
}

impl FakeBackend {
    fn ok(behavior: DownloadBehavior) -> Self {
        Self {
            login_calls: Arc::new(AtomicUsize::new(0)),
            fetch_calls: Arc::new(AtomicUsize::new(0)),
            login_result: None,
            behavior,
            delay: Duration::ZERO,
        }
    }
}

#[async_trait]
impl InstagramBackend for FakeBackend {
    async fn login(&self, _username: &str, _password: &str) -> Result<(), AuthError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        match self.login_result {
            Some(make_err) => Err(make_err()),
            None => Ok(()),
        }
    }

    async fn fetch_post(&self, shortcode: &str) -> Result<PostHandle, DownloadError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PostHandle {
            shortcode: shortcode.to_string(),
            video_url: format!("https://cdn.example/{}.mp4", shortcode),
        })
    }

    async fn download_post(&self, post: &PostHandle, target_dir: &Path) -> Result<PathBuf, DownloadError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let path = target_dir.join(format!("{}.mp4", post.shortcode));
        if matches!(self.behavior, DownloadBehavior::WriteVideo) {
            std::fs::write(&path, b"video-bytes").map_err(|e| DownloadError::Unknown(e.to_string()))?;
        }
        Ok(path)
    }
}

fn credentials() -> InstagramCredentials {
    InstagramCredentials {
        username: "bot-account".to_string(),
        password: "hunter2".to_string(),
    }
}

fn dispatcher_with(tmp: &TempDir, backend: FakeBackend) -> DownloadDispatcher {
    let scratch = ScratchDir::create(tmp.path().to_str().unwrap()).unwrap();
    let session = InstagramSession::with_backend(Box::new(backend), credentials());
    DownloadDispatcher::with_session(scratch, session)
}

#[tokio::test]
async fn invalid_url_fails_without_touching_the_scratch_directory() {
    let tmp = TempDir::new().unwrap();
    let backend = FakeBackend::ok(DownloadBehavior::WriteVideo);
    let fetch_calls = backend.fetch_calls.clone();
    let login_calls = backend.login_calls.clone();
    let dispatcher = dispatcher_with(&tmp, backend);

    // Sentinel file: prepare() would remove it
    let sentinel = tmp.path().join("sentinel.mp4");
    std::fs::write(&sentinel, b"x").unwrap();

    let result = dispatcher.dispatch("https://www.youtube.com/watch?v=abc").await;

    assert!(matches!(result, Err(DownloadError::InvalidUrl)));
    assert!(sentinel.exists(), "classifier rejection must not clean the directory");
    assert_eq!(login_calls.load(Ordering::SeqCst), 0);
    assert_eq!(fetch_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn instagram_dispatch_resolves_the_downloaded_file() {
    let tmp = TempDir::new().unwrap();
    let dispatcher = dispatcher_with(&tmp, FakeBackend::ok(DownloadBehavior::WriteVideo));

    let path = dispatcher
        .dispatch("https://www.instagram.com/p/ABC123/")
        .await
        .unwrap();

    assert!(path.ends_with("ABC123.mp4"));
    assert!(path.exists());

    dispatcher.finish(&path);
    assert!(!path.exists(), "finish must delete the staged file");
}

#[tokio::test]
async fn stale_files_are_removed_before_an_instagram_download() {
    let tmp = TempDir::new().unwrap();
    let dispatcher = dispatcher_with(&tmp, FakeBackend::ok(DownloadBehavior::WriteVideo));

    let stale = tmp.path().join("leftover.mp4");
    std::fs::write(&stale, b"old").unwrap();

    let path = dispatcher
        .dispatch("https://www.instagram.com/reel/FRESH1/")
        .await
        .unwrap();

    assert!(path.ends_with("FRESH1.mp4"));
    assert!(!stale.exists(), "stale file must not survive prepare()");
}

#[tokio::test]
async fn bad_credentials_surface_as_auth_failure() {
    let tmp = TempDir::new().unwrap();
    let mut backend = FakeBackend::ok(DownloadBehavior::WriteVideo);
    backend.login_result = Some(|| AuthError::BadCredentials);
    let fetch_calls = backend.fetch_calls.clone();
    let dispatcher = dispatcher_with(&tmp, backend);

    let result = dispatcher.dispatch("https://www.instagram.com/p/ABC123/").await;

    assert!(matches!(result, Err(DownloadError::Auth(AuthError::BadCredentials))));
    assert_eq!(fetch_calls.load(Ordering::SeqCst), 0, "no post fetch after failed login");
}

#[tokio::test]
async fn missing_output_file_yields_file_not_found() {
    let tmp = TempDir::new().unwrap();
    let dispatcher = dispatcher_with(&tmp, FakeBackend::ok(DownloadBehavior::WriteNothing));

    let result = dispatcher.dispatch("https://www.instagram.com/p/GHOST/").await;

    assert!(matches!(result, Err(DownloadError::FileNotFound)));
    // Nothing to delete — finish on a never-produced path must be harmless
    dispatcher.finish(&tmp.path().join("GHOST.mp4"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_instagram_dispatches_never_steal_each_others_file() {
    let tmp = TempDir::new().unwrap();
    let mut backend = FakeBackend::ok(DownloadBehavior::WriteVideo);
    backend.delay = Duration::from_millis(50);
    let dispatcher = Arc::new(dispatcher_with(&tmp, backend));

    let a = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move { dispatcher.dispatch("https://www.instagram.com/p/FIRST/").await })
    };
    let b = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move { dispatcher.dispatch("https://www.instagram.com/p/SECOND/").await })
    };

    let path_a = a.await.unwrap().unwrap();
    let path_b = b.await.unwrap().unwrap();

    // The directory lock serializes prepare → fetch → resolve, so each
    // request resolves exactly the file its own download produced.
    assert!(path_a.ends_with("FIRST.mp4"));
    assert!(path_b.ends_with("SECOND.mp4"));
    assert_ne!(path_a, path_b);
}

#[tokio::test]
async fn session_survives_across_requests() {
    let tmp = TempDir::new().unwrap();
    let backend = FakeBackend::ok(DownloadBehavior::WriteVideo);
    let login_calls = backend.login_calls.clone();
    let dispatcher = dispatcher_with(&tmp, backend);

    let first = dispatcher
        .dispatch("https://www.instagram.com/p/ONE/")
        .await
        .unwrap();
    dispatcher.finish(&first);

    let second = dispatcher
        .dispatch("https://www.instagram.com/p/TWO/")
        .await
        .unwrap();
    dispatcher.finish(&second);

    assert_eq!(login_calls.load(Ordering::SeqCst), 1, "login happens once per process");
}

#[tokio::test]
async fn malformed_instagram_url_is_a_classified_input_error() {
    let tmp = TempDir::new().unwrap();
    let dispatcher = dispatcher_with(&tmp, FakeBackend::ok(DownloadBehavior::WriteVideo));

    // instagram.com substring classifies, but there is no shortcode segment
    let result = dispatcher.dispatch("https://www.instagram.com/").await;

    assert!(matches!(result, Err(DownloadError::InvalidUrl)));
}
