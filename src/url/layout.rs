//! Mapping from URLs to artifact paths
//!
//! Only the path component of a URL takes part in the layout; host, query and
//! fragment are ignored, so `https://a.example/x` and `https://b.example/x`
//! share an artifact.

use std::path::{Path, PathBuf};
use url::Url;

/// File name of the HTML artifact inside each mirrored directory
pub const INDEX_FILE: &str = "index.html";

/// Extension given to screenshot files
pub const SCREENSHOT_EXTENSION: &str = "png";

/// Stem used for the screenshot of the root path
const ROOT_SCREENSHOT_STEM: &str = "index";

/// Returns the non-empty path segments of a URL, still percent-encoded
///
/// Empty segments from repeated or trailing slashes are dropped, as are dot
/// segments, so the result never escapes the directory it is joined onto.
///
/// # Examples
///
/// ```
/// use sumi_mirror::url::path_segments;
/// use url::Url;
///
/// let url = Url::parse("https://example.com//docs/guide/").unwrap();
/// assert_eq!(path_segments(&url), vec!["docs", "guide"]);
/// ```
pub fn path_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segments| {
            segments
                .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
                .collect()
        })
        .unwrap_or_default()
}

/// Derives where the rendered HTML for `url` is stored
///
/// `https://example.com/docs/guide` under `out` becomes
/// `out/docs/guide/index.html`; the root path becomes `out/index.html`.
pub fn html_path(output_dir: &Path, url: &Url) -> PathBuf {
    let mut path = output_dir.to_path_buf();
    for segment in path_segments(url) {
        path.push(segment);
    }
    path.push(INDEX_FILE);
    path
}

/// Derives where the screenshot for `url` is stored
///
/// The last segment becomes the file stem (`/docs/guide` maps to
/// `docs/guide.png`); the root path maps to `index.png`.
pub fn screenshot_path(screenshot_dir: &Path, url: &Url) -> PathBuf {
    let segments = path_segments(url);
    let mut path = screenshot_dir.to_path_buf();

    match segments.split_last() {
        Some((last, parents)) => {
            for segment in parents {
                path.push(segment);
            }
            path.push(format!("{}.{}", last, SCREENSHOT_EXTENSION));
        }
        None => path.push(format!("{}.{}", ROOT_SCREENSHOT_STEM, SCREENSHOT_EXTENSION)),
    }

    path
}
