//! URL handling module for Sumi-Mirror
//!
//! This module parses target URLs and maps them onto the on-disk layout of
//! the mirror.

mod layout;

pub use layout::{html_path, path_segments, screenshot_path, INDEX_FILE, SCREENSHOT_EXTENSION};

use crate::UrlError;
use url::Url;

/// Schemes a target URL may use
const SUPPORTED_SCHEMES: &[&str] = &["http", "https"];

/// Parses a target URL, rejecting anything the mirror cannot lay out on disk
///
/// The URL must be absolute, use HTTP or HTTPS, and carry a host.
///
/// # Examples
///
/// ```
/// use sumi_mirror::url::parse_target_url;
///
/// let url = parse_target_url("https://example.com/docs/guide").unwrap();
/// assert_eq!(url.path(), "/docs/guide");
/// assert!(parse_target_url("/docs/guide").is_err());
/// ```
pub fn parse_target_url(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();
    let url = Url::parse(trimmed).map_err(|e| UrlError::Parse {
        url: trimmed.to_string(),
        message: e.to_string(),
    })?;

    if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost(trimmed.to_string()));
    }

    Ok(url)
}
