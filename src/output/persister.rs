//! Site persister
//!
//! Writes rendered pages into a directory tree that mirrors URL paths, plus
//! optional screenshots into a parallel tree.

use crate::config::OutputConfig;
use crate::render::RenderSession;
use crate::url::{html_path, screenshot_path};
use crate::MirrorError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use url::Url;

/// The HTML file written for one URL
///
/// Screenshots are reported separately by `persist_screenshot`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedArtifact {
    pub html_path: PathBuf,
}

/// Maps URLs onto the output tree and writes their artifacts
#[derive(Debug, Clone)]
pub struct SitePersister {
    output_dir: PathBuf,
    screenshot_dir: Option<PathBuf>,
}

impl SitePersister {
    /// Creates a persister; screenshots are only written when `screenshot_dir` is set
    pub fn new(output_dir: impl Into<PathBuf>, screenshot_dir: Option<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            screenshot_dir,
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        let screenshot_dir = config
            .screenshots
            .then(|| config.screenshot_directory.clone());
        Self::new(config.directory.clone(), screenshot_dir)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn screenshots_enabled(&self) -> bool {
        self.screenshot_dir.is_some()
    }

    /// Where the HTML for `url` lands
    pub fn html_path(&self, url: &Url) -> PathBuf {
        html_path(&self.output_dir, url)
    }

    /// Where the screenshot for `url` lands, when screenshots are enabled
    pub fn screenshot_path(&self, url: &Url) -> Option<PathBuf> {
        self.screenshot_dir
            .as_deref()
            .map(|dir| screenshot_path(dir, url))
    }

    /// Writes `content` verbatim to the HTML artifact of `url`
    ///
    /// Missing directories are created. An existing artifact is replaced
    /// through a temporary file and a rename, so readers never observe a
    /// half-written page.
    ///
    /// # Errors
    ///
    /// * `PathConflict` - A file occupies a directory the layout needs, or a
    ///   directory occupies the artifact path
    /// * `Filesystem` - Creating directories or writing the file failed
    pub async fn persist(
        &self,
        url: &Url,
        content: &str,
    ) -> Result<PersistedArtifact, MirrorError> {
        let path = self.html_path(url);
        write_artifact(&self.output_dir, &path, content.as_bytes()).await?;
        tracing::debug!("Wrote {} bytes to {}", content.len(), path.display());

        Ok(PersistedArtifact { html_path: path })
    }

    /// Captures the current page of `session` and stores it for `url`
    ///
    /// Returns `Ok(None)` without touching the session when screenshots are
    /// disabled.
    pub async fn persist_screenshot<S>(
        &self,
        url: &Url,
        session: &mut S,
    ) -> Result<Option<PathBuf>, MirrorError>
    where
        S: RenderSession + ?Sized,
    {
        let Some(root) = self.screenshot_dir.as_deref() else {
            return Ok(None);
        };

        let path = screenshot_path(root, url);
        let image = session
            .screenshot()
            .await
            .map_err(|e| MirrorError::from_render(url.as_str(), e))?;

        write_artifact(root, &path, &image).await?;
        tracing::debug!("Screenshot saved to {}", path.display());

        Ok(Some(path))
    }
}

/// Creates the parents of `target` below `root` and replaces `target` with `bytes`
async fn write_artifact(root: &Path, target: &Path, bytes: &[u8]) -> Result<(), MirrorError> {
    let parent = target.parent().unwrap_or(root);
    ensure_directories(root, parent).await?;

    if is_directory(target).await? {
        return Err(MirrorError::PathConflict {
            path: target.to_path_buf(),
        });
    }

    let mut temp = target.as_os_str().to_os_string();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    if let Err(e) = tokio::fs::write(&temp, bytes).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(MirrorError::filesystem(&temp, e));
    }

    if let Err(e) = tokio::fs::rename(&temp, target).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(MirrorError::filesystem(target, e));
    }

    Ok(())
}

/// Creates `dir` and its ancestors, refusing to tunnel through existing files
async fn ensure_directories(root: &Path, dir: &Path) -> Result<(), MirrorError> {
    let mut current = root.to_path_buf();
    check_not_file(&current).await?;

    if let Ok(relative) = dir.strip_prefix(root) {
        for component in relative.components() {
            current.push(component);
            check_not_file(&current).await?;
        }
    }

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| MirrorError::filesystem(dir, e))
}

async fn check_not_file(path: &Path) -> Result<(), MirrorError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if !metadata.is_dir() => Err(MirrorError::PathConflict {
            path: path.to_path_buf(),
        }),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(MirrorError::filesystem(path, e)),
    }
}

async fn is_directory(path: &Path) -> Result<bool, MirrorError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => Ok(metadata.is_dir()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(MirrorError::filesystem(path, e)),
    }
}
