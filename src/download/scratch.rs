//! Shared scratch directory for staged downloads.
//!
//! The Instagram backend writes post-dependent filenames into this
//! directory, so a leftover file from a previous request could be mistaken
//! for the new result. `prepare()` empties the directory before such a
//! download starts; callers serialize the prepare → fetch → resolve span
//! through the dispatcher's directory lock.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Handle to the process-wide scratch directory.
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    /// Create the scratch directory if absent and return a handle to it.
    /// Tilde in the configured path is expanded to the home directory.
    pub fn create(root: &str) -> io::Result<Self> {
        let expanded = shellexpand::tilde(root).to_string();
        let root = PathBuf::from(expanded);
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Remove every entry currently in the directory.
    ///
    /// Best-effort: individual deletion failures are logged and the request
    /// proceeds. Calling this on an empty directory is a no-op.
    pub fn prepare(&self) {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("scratch: failed to list {}: {}", self.root.display(), e);
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let result = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            if let Err(e) = result {
                log::warn!("scratch: failed to remove stale entry {}: {}", path.display(), e);
            } else {
                log::debug!("scratch: removed stale entry {}", path.display());
            }
        }
    }

    /// Walk the directory recursively and return the first file whose name
    /// ends with `extension` (e.g. `.mp4`).
    ///
    /// If several files match, the first one encountered in walk order wins.
    /// That is only a safe answer because `prepare()` emptied the directory
    /// before the download that produced the file.
    pub fn resolve_output(&self, extension: &str) -> Option<PathBuf> {
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!("scratch: failed to list {}: {}", dir.display(), e);
                    continue;
                }
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    pending.push(path);
                } else if path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(extension))
                {
                    return Some(path);
                }
            }
        }
        None
    }

    /// Remove one staged file after delivery has been attempted.
    ///
    /// A missing file is not an error; other failures are logged, never
    /// escalated.
    pub fn delete(&self, path: &Path) {
        match fs::remove_file(path) {
            Ok(()) => log::info!("scratch: deleted {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("scratch: {} already gone", path.display());
            }
            Err(e) => log::warn!("scratch: failed to delete {}: {}", path.display(), e),
        }
    }
}
