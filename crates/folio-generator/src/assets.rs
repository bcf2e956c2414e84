//! Static asset copying.
//!
//! Everything under the static directory (thumbnails, sketch scripts, fonts)
//! is copied verbatim to the output root, keeping relative paths.

use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Asset processing errors.
#[derive(Debug, Error)]
pub enum AssetError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk error.
    #[error("cannot walk static directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// Invalid asset path.
    #[error("invalid asset path: {}", .0.display())]
    InvalidPath(PathBuf),
}

/// Result type for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;

/// Stylesheet written when the static directory does not provide one.
pub const DEFAULT_STYLESHEET: &str = r#":root { --bg: #fdfdfc; --fg: #1d1d1f; --muted: #6b7280; --accent: #2563eb; }
[data-theme="dark"] { --bg: #111318; --fg: #e5e7eb; --muted: #9ca3af; --accent: #60a5fa; }
body { margin: 0 auto; max-width: 46rem; padding: 0 1rem; background: var(--bg); color: var(--fg); font-family: system-ui, sans-serif; line-height: 1.6; }
a { color: var(--accent); }
.site-nav { display: flex; gap: 1.5rem; align-items: baseline; padding: 1rem 0; }
.nav-links { display: flex; gap: 1rem; list-style: none; margin: 0; padding: 0; }
.meta, .back, time, .reading-time { color: var(--muted); font-size: 0.9rem; }
.thumbnail { width: 100%; height: auto; border-radius: 0.5rem; }
.tags a { margin-right: 0.5rem; }
.entries { list-style: none; padding: 0; }
"#;

/// Copy every non-hidden file below `source_dir` into `dest_dir`.
///
/// Returns the number of files copied. A missing source directory is not an
/// error; a site without static files is valid.
pub fn copy_static(source_dir: &Path, dest_dir: &Path) -> Result<usize> {
    if !source_dir.is_dir() {
        debug!(dir = %source_dir.display(), "no static directory, skipping");
        return Ok(0);
    }

    info!(
        source = %source_dir.display(),
        dest = %dest_dir.display(),
        "copying static assets"
    );

    let mut copied = 0;
    let walker = WalkDir::new(source_dir)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|_| AssetError::InvalidPath(entry.path().to_path_buf()))?;
        let dest = dest_dir.join(relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &dest)?;
        copied += 1;
    }

    info!(count = copied, "static assets copied");
    Ok(copied)
}

/// Write [`DEFAULT_STYLESHEET`] unless `style.css` already exists in `dest_dir`.
pub fn ensure_stylesheet(dest_dir: &Path) -> Result<()> {
    let path = dest_dir.join("style.css");
    if !path.exists() {
        fs::create_dir_all(dest_dir)?;
        fs::write(&path, DEFAULT_STYLESHEET)?;
    }
    Ok(())
}
