//! Sumi-Mirror: a static snapshotter for rendered web pages
//!
//! This crate drives a headless browser through a list of URLs, waits for each
//! page to go idle, and writes the rendered DOM (and optionally a full-page
//! screenshot) into a directory tree that mirrors the URL paths.

pub mod config;
pub mod crawler;
pub mod output;
pub mod render;
pub mod state;
pub mod url;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for Sumi-Mirror operations
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Navigation to {url} timed out after {}ms", .timeout.as_millis())]
    NavigationTimeout { url: String, timeout: Duration },

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Malformed URL: {0}")]
    MalformedUrl(#[from] UrlError),

    #[error("Filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Path conflict at {}: a file and a directory would share this path", .path.display())]
    PathConflict { path: PathBuf },

    #[error("Browser session failed: {0}")]
    SessionFatal(String),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::UrlState,
        to: state::UrlState,
    },

    #[error("Report error: {0}")]
    Report(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MirrorError {
    /// Wraps an IO error with the path it occurred on
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Attaches the URL to a render error and sorts it into the run's taxonomy
    ///
    /// A lost browser becomes `SessionFatal`; a timeout keeps its duration.
    pub fn from_render(url: &str, error: RenderError) -> Self {
        match error {
            RenderError::Timeout(timeout) => Self::NavigationTimeout {
                url: url.to_string(),
                timeout,
            },
            RenderError::Launch(_) | RenderError::SessionLost(_) => {
                Self::SessionFatal(error.to_string())
            }
            RenderError::Navigation(_) | RenderError::Content(_) | RenderError::Screenshot(_) => {
                Self::Navigation {
                    url: url.to_string(),
                    message: error.to_string(),
                }
            }
        }
    }

    /// Returns the failure category this error is reported under
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NavigationTimeout { .. } => FailureKind::NavigationTimeout,
            Self::Navigation { .. } => FailureKind::Navigation,
            Self::MalformedUrl(_) => FailureKind::MalformedUrl,
            Self::Filesystem { .. } | Self::PathConflict { .. } | Self::Io(_) => {
                FailureKind::Filesystem
            }
            Self::SessionFatal(_) => FailureKind::SessionFatal,
            Self::Config(_) | Self::InvalidTransition { .. } | Self::Report(_) => {
                FailureKind::Internal
            }
        }
    }

    /// Returns true if the whole run has to stop
    ///
    /// Everything else is isolated to the URL that caused it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SessionFatal(_))
    }
}

/// Tag attached to every per-URL failure in the run report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NavigationTimeout,
    Navigation,
    MalformedUrl,
    Filesystem,
    SessionFatal,
    Internal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NavigationTimeout => "navigation_timeout",
            Self::Navigation => "navigation",
            Self::MalformedUrl => "malformed_url",
            Self::Filesystem => "filesystem",
            Self::SessionFatal => "session_fatal",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL '{url}': {message}")]
    Parse { url: String, message: String },

    #[error("Unsupported URL scheme '{0}'")]
    InvalidScheme(String),

    #[error("URL has no host: {0}")]
    MissingHost(String),
}

/// Result type alias for Sumi-Mirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::RunConfig;
pub use crawler::{run_mirror, Coordinator, RunAborted};
pub use output::RunReport;
pub use render::{RenderError, RenderSession};
pub use state::UrlState;
