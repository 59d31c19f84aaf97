//! Page fetcher
//!
//! This module handles one URL's trip through the browser:
//! - Navigation with idle detection, retried on transient failures
//! - Load time measurement around the successful attempt
//! - Reading the rendered DOM
//! - Mapping render errors onto the run's error taxonomy

use crate::config::NavigationConfig;
use crate::crawler::retry::{execute_if, RetryPolicy};
use crate::render::{RenderError, RenderSession};
use crate::MirrorError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

/// Wall-clock time a page took to load, reported in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct LoadTime(Duration);

impl LoadTime {
    pub fn new(elapsed: Duration) -> Self {
        Self(elapsed)
    }

    pub fn duration(&self) -> Duration {
        self.0
    }

    /// Seconds rounded to two decimals
    pub fn seconds(&self) -> f64 {
        (self.0.as_secs_f64() * 100.0).round() / 100.0
    }
}

impl fmt::Display for LoadTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.seconds())
    }
}

impl Serialize for LoadTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.seconds())
    }
}

/// Result of a successful fetch
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Serialized DOM once the page went idle
    pub content: String,
    /// Duration of the navigation that succeeded
    pub load_time: LoadTime,
    /// Number of navigation attempts used, the successful one included
    pub attempts: u32,
}

/// A failed fetch and the number of navigation attempts it used
#[derive(Debug, Error)]
#[error("{error}")]
pub struct FetchFailure {
    pub error: MirrorError,
    /// Navigation attempts made before giving up, 0 if none was made
    pub attempts: u32,
}

impl From<FetchFailure> for MirrorError {
    fn from(failure: FetchFailure) -> Self {
        failure.error
    }
}

/// Builds the retry policy for navigations from the run configuration
pub fn navigation_policy(config: &NavigationConfig) -> RetryPolicy {
    RetryPolicy::new(config.retries, config.retry_interval())
}

/// Navigates to `url`, waits for it to settle, and returns its rendered HTML
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Idle timeout | Retry up to `retries` attempts, fixed interval |
/// | Other navigation error | Retry up to `retries` attempts, fixed interval |
/// | Browser lost | Immediate → `SessionFatal` |
///
/// Only the successful attempt is timed; failed attempts and backoff pauses
/// do not count towards the load time.
///
/// # Arguments
///
/// * `session` - The run's render session
/// * `url` - The URL to open
/// * `config` - Timeout and retry budget
pub async fn fetch<S>(
    session: &mut S,
    url: &Url,
    config: &NavigationConfig,
) -> Result<FetchedPage, FetchFailure>
where
    S: RenderSession + ?Sized,
{
    let policy = navigation_policy(config);
    let timeout = config.timeout();
    let made = AtomicU32::new(0);
    let failure = |error: RenderError, attempts: u32| FetchFailure {
        error: MirrorError::from_render(url.as_str(), error),
        attempts,
    };

    // Every attempt gets its own future; the lock lets each one borrow the
    // session in turn
    let session = Mutex::new(session);

    let navigated = execute_if(
        policy,
        |attempt| {
            let session = &session;
            made.store(attempt, Ordering::Relaxed);
            async move {
                let mut session = session.lock().await;
                tracing::info!(
                    "Open: {} (attempt {}/{})",
                    url,
                    attempt,
                    policy.max_attempts()
                );

                let started = Instant::now();
                session.navigate(url.as_str(), timeout).await?;
                Ok((LoadTime::new(started.elapsed()), attempt))
            }
        },
        |error: &RenderError| !error.is_session_lost(),
    )
    .await;

    let (load_time, attempts) =
        navigated.map_err(|e| failure(e, made.load(Ordering::Relaxed)))?;

    let session = session.into_inner();
    let content = session
        .content()
        .await
        .map_err(|e| failure(e, attempts))?;

    Ok(FetchedPage {
        content,
        load_time,
        attempts,
    })
}
