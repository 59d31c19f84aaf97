//! Mirror coordinator - main run orchestration logic
//!
//! This module contains the loop that walks the URL list in order and, for
//! each URL:
//! - Parses and validates it
//! - Fetches the rendered page through the session
//! - Persists the HTML and optional screenshot
//! - Records the outcome, isolating every failure except a lost browser

use crate::config::{config_fingerprint, RunConfig};
use crate::crawler::fetcher::{fetch, FetchedPage};
use crate::output::{Failure, RunReport, SitePersister, UrlOutcome};
use crate::render::{ChromeSession, RenderSession};
use crate::state::UrlState;
use crate::url::parse_target_url;
use crate::MirrorError;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Headroom given to individual DevTools commands on top of the navigation timeout
const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

/// A run stopped by a fatal error, with the report of what it got through
///
/// URLs after the one that failed are listed as `Pending`.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct RunAborted {
    pub error: MirrorError,
    pub report: Box<RunReport>,
}

impl RunAborted {
    fn new(error: MirrorError, mut report: RunReport) -> Self {
        report.abort(&error);
        Self {
            error,
            report: Box::new(report),
        }
    }
}

impl From<RunAborted> for MirrorError {
    fn from(aborted: RunAborted) -> Self {
        aborted.error
    }
}

/// Main mirror coordinator structure
///
/// Owns the render session for the whole run; URLs are processed one at a
/// time, so the session is never shared.
pub struct Coordinator<S: RenderSession> {
    config: RunConfig,
    session: S,
    persister: SitePersister,
}

impl<S: RenderSession> Coordinator<S> {
    /// Creates a coordinator around an already launched session
    pub fn new(config: RunConfig, session: S) -> Self {
        let persister = SitePersister::from_config(&config.output);
        Self {
            config,
            session,
            persister,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn persister(&self) -> &SitePersister {
        &self.persister
    }

    /// Runs the mirror over `urls` in order
    ///
    /// Per-URL failures are logged and recorded in the report, and the loop
    /// moves on. A lost browser session stops the run: the URLs after it are
    /// not attempted and the error is returned along with the partial report.
    pub async fn run(&mut self, urls: &[String]) -> Result<RunReport, RunAborted> {
        let mut report = start_report(&self.config);
        tracing::info!(
            "Mirroring {} URLs into {}",
            urls.len(),
            self.persister.output_dir().display()
        );

        for (index, input) in urls.iter().enumerate() {
            let mut outcome = UrlOutcome::pending(input.as_str());
            let processed = self.process_url(&mut outcome).await;
            report.record(outcome);

            if let Err(e) = processed {
                tracing::error!("Aborting run at {}: {}", input, e);
                let skipped = &urls[index + 1..];
                if !skipped.is_empty() {
                    tracing::warn!("{} URLs were not attempted", skipped.len());
                }
                for url in skipped {
                    report.record(UrlOutcome::pending(url.as_str()));
                }
                return Err(RunAborted::new(e, report));
            }
        }

        report.finish();
        tracing::info!(
            "Mirror completed: {} of {} URLs saved",
            report.succeeded(),
            report.total()
        );

        Ok(report)
    }

    /// Runs the mirror, then closes the session whether or not the run succeeded
    pub async fn run_and_close(&mut self, urls: &[String]) -> Result<RunReport, RunAborted> {
        let result = self.run(urls).await;

        if let Err(e) = self.finish().await {
            tracing::warn!("Failed to close browser: {}", e);
        }

        result
    }

    /// Closes the render session
    pub async fn finish(&mut self) -> Result<(), MirrorError> {
        self.session
            .close()
            .await
            .map_err(|e| MirrorError::SessionFatal(e.to_string()))
    }

    /// Processes a single URL, recording its progress in `outcome`
    ///
    /// Returns an error only when the run cannot continue.
    async fn process_url(&mut self, outcome: &mut UrlOutcome) -> Result<(), MirrorError> {
        advance(outcome, UrlState::Fetching)?;

        let url = match parse_target_url(&outcome.url) {
            Ok(url) => url,
            Err(e) => return fail(outcome, UrlState::FetchFailed, e.into()),
        };

        let page = match fetch(&mut self.session, &url, &self.config.navigation).await {
            Ok(page) => page,
            Err(failure) => {
                outcome.attempts = failure.attempts;
                return fail(outcome, UrlState::FetchFailed, failure.error);
            }
        };

        outcome.attempts = page.attempts;
        outcome.load_time = Some(page.load_time);
        advance(outcome, UrlState::Fetched)?;
        advance(outcome, UrlState::Persisting)?;

        if let Err(e) = self.persist(&url, &page, outcome).await {
            return fail(outcome, UrlState::PersistFailed, e);
        }

        advance(outcome, UrlState::Done)?;
        tracing::info!(
            "Saved: {} (Load time: {} seconds)",
            outcome
                .saved_path
                .as_deref()
                .map(|path| path.display().to_string())
                .unwrap_or_default(),
            page.load_time
        );

        Ok(())
    }

    /// Writes the page and, when enabled, its screenshot
    async fn persist(
        &mut self,
        url: &Url,
        page: &FetchedPage,
        outcome: &mut UrlOutcome,
    ) -> Result<(), MirrorError> {
        let artifact = self.persister.persist(url, &page.content).await?;
        outcome.saved_path = Some(artifact.html_path);

        outcome.screenshot_path = self
            .persister
            .persist_screenshot(url, &mut self.session)
            .await?;

        Ok(())
    }
}

/// Moves the outcome to `next`, rejecting transitions the lifecycle forbids
fn advance(outcome: &mut UrlOutcome, next: UrlState) -> Result<(), MirrorError> {
    if !outcome.state.can_transition_to(next) {
        return Err(MirrorError::InvalidTransition {
            from: outcome.state,
            to: next,
        });
    }
    outcome.state = next;
    Ok(())
}

/// Records a failure on the outcome, handing the error back if it is fatal
fn fail(outcome: &mut UrlOutcome, state: UrlState, error: MirrorError) -> Result<(), MirrorError> {
    outcome.failure = Some(Failure::from(&error));
    advance(outcome, state)?;

    if error.is_fatal() {
        return Err(error);
    }
    tracing::error!("Failed to save: {}: {}", outcome.url, error);
    Ok(())
}

/// Starts an empty report for a run of `config`
fn start_report(config: &RunConfig) -> RunReport {
    let fingerprint = config_fingerprint(config).unwrap_or_else(|e| {
        tracing::warn!("Could not fingerprint configuration: {}", e);
        String::new()
    });
    RunReport::new(fingerprint)
}

/// Runs a complete mirror operation
///
/// This is the main entry point for a run. It will:
/// 1. Launch the browser
/// 2. Fetch and persist every URL in order
/// 3. Close the browser, whether or not the run succeeded
///
/// If the browser cannot be launched, every URL is reported as `Pending`.
///
/// # Example
///
/// ```no_run
/// use sumi_mirror::config::load_config;
/// use sumi_mirror::crawler::run_mirror;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("mirror.toml"))?;
/// let urls = config.urls.clone();
/// let report = run_mirror(config, &urls).await?;
/// report.print_summary();
/// # Ok(())
/// # }
/// ```
pub async fn run_mirror(config: RunConfig, urls: &[String]) -> Result<RunReport, RunAborted> {
    let request_timeout = config.navigation.timeout() + REQUEST_TIMEOUT_MARGIN;
    let session = match ChromeSession::launch(&config.browser, &config.idle, request_timeout).await
    {
        Ok(session) => session,
        Err(e) => {
            let mut report = start_report(&config);
            for url in urls {
                report.record(UrlOutcome::pending(url.as_str()));
            }
            return Err(RunAborted::new(
                MirrorError::SessionFatal(e.to_string()),
                report,
            ));
        }
    };

    Coordinator::new(config, session).run_and_close(urls).await
}
