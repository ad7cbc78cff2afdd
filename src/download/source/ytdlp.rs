//! Stateless download source powered by yt-dlp.
//!
//! Handles Twitter/X and TikTok (and anything else the extractor knows)
//! without any session state. The output template caps the sanitized title
//! at 40 characters; `--print after_move:filepath` makes the backend report
//! the exact path it wrote, so no directory scan is needed afterwards.

use crate::core::config;
use crate::download::error::DownloadError;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// Download source invoking the yt-dlp binary for session-free platforms.
pub struct YtDlpSource {
    bin: String,
    output_dir: PathBuf,
}

impl YtDlpSource {
    /// Use the configured binary (`YTDL_BIN`, default `yt-dlp`).
    pub fn new(output_dir: PathBuf) -> Self {
        Self::with_binary(config::YTDL_BIN.clone(), output_dir)
    }

    pub fn with_binary(bin: String, output_dir: PathBuf) -> Self {
        Self { bin, output_dir }
    }

    fn build_args(&self, url: &str) -> Vec<String> {
        vec![
            "-o".to_string(),
            format!("{}/%(title).40s.%(ext)s", self.output_dir.display()),
            "-f".to_string(),
            "best[ext=mp4]".to_string(),
            "--no-check-certificate".to_string(),
            "--restrict-filenames".to_string(),
            "--no-playlist".to_string(),
            "--newline".to_string(),
            "--no-simulate".to_string(),
            "--print".to_string(),
            "after_move:filepath".to_string(),
            url.to_string(),
        ]
    }

    /// Download one video and return the path the extractor reports.
    ///
    /// The subprocess is bounded by the configured fetch timeout and killed
    /// on expiry; every failure surfaces as a classified error.
    pub async fn fetch(&self, url: &str) -> Result<PathBuf, DownloadError> {
        let args = self.build_args(url);
        log::info!("ytdlp: extracting {}", url);
        log::debug!("ytdlp: {} {}", self.bin, args.join(" "));

        let child = Command::new(&self.bin)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DownloadError::Extraction(format!("failed to spawn {}: {}", self.bin, e)))?;

        let output = match tokio::time::timeout(config::download::fetch_timeout(), child.wait_with_output()).await {
            Ok(result) => {
                result.map_err(|e| DownloadError::Extraction(format!("extractor process failed: {}", e)))?
            }
            Err(_) => {
                log::error!(
                    "ytdlp: timed out after {}s, killing extractor",
                    config::download::FETCH_TIMEOUT_SECS
                );
                return Err(DownloadError::Timeout(config::download::FETCH_TIMEOUT_SECS));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            log::error!(
                "ytdlp: failed (exit {}): {}",
                output.status.code().unwrap_or(-1),
                stderr.chars().take(500).collect::<String>()
            );
            return Err(DownloadError::Extraction(extraction_reason(&stderr)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let path = stdout
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(PathBuf::from);

        match path {
            Some(path) => {
                log::info!("ytdlp: wrote {}", path.display());
                Ok(path)
            }
            None => {
                log::warn!("ytdlp: extractor exited cleanly but reported no output file");
                Err(DownloadError::FileNotFound)
            }
        }
    }
}

/// Condense yt-dlp stderr into a short human-meaningful reason.
fn extraction_reason(stderr: &str) -> String {
    let lower = stderr.to_lowercase();

    if lower.contains("requested format is not available") || lower.contains("no video formats found") {
        return "no mp4 stream is available for this post".to_string();
    }
    if lower.contains("not available in your country") || lower.contains("geo restriction") {
        return "the video is blocked in this region".to_string();
    }
    if lower.contains("private") || lower.contains("unavailable") || lower.contains("does not exist") {
        return "the video is private, removed or does not exist".to_string();
    }
    if lower.contains("timed out")
        || lower.contains("connection")
        || lower.contains("network")
        || lower.contains("dns")
    {
        return "network failure while contacting the extractor".to_string();
    }

    // Fall back to the extractor's own last ERROR line, trimmed
    stderr
        .lines()
        .rev()
        .find(|line| line.starts_with("ERROR:"))
        .map(|line| line.trim_start_matches("ERROR:").trim().chars().take(200).collect())
        .unwrap_or_else(|| "the extractor failed".to_string())
}
