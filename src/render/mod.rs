//! Render module: headless browser sessions
//!
//! This module contains:
//! - The `RenderSession` trait the crawler drives
//! - A Chromium implementation over the DevTools protocol
//! - Network idle tracking used to decide when a page has settled

mod chrome;
mod idle;

pub use chrome::ChromeSession;
pub use idle::{IdleTracker, NetworkEvent};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a render session
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Navigation did not settle within {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Failed to read page content: {0}")]
    Content(String),

    #[error("Screenshot failed: {0}")]
    Screenshot(String),

    #[error("Browser session lost: {0}")]
    SessionLost(String),
}

impl RenderError {
    /// Returns true if the browser itself is gone and nothing can be retried
    pub fn is_session_lost(&self) -> bool {
        matches!(self, Self::Launch(_) | Self::SessionLost(_))
    }
}

/// One browser page reused for every URL of a run
///
/// Calls are strictly sequential; a session never navigates two URLs at once.
#[async_trait]
pub trait RenderSession: Send {
    /// Opens `url` and waits until the page is idle or `timeout` elapses
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), RenderError>;

    /// Returns the serialized DOM as it is right now
    async fn content(&mut self) -> Result<String, RenderError>;

    /// Captures the full scrollable page as PNG bytes
    async fn screenshot(&mut self) -> Result<Vec<u8>, RenderError>;

    /// Releases the browser
    async fn close(&mut self) -> Result<(), RenderError>;
}
