//! Per-URL outcomes of a mirror run
//!
//! The report is filled in by the coordinator as URLs finish, printed as a
//! console summary at the end, and optionally exported as JSON.

use crate::crawler::LoadTime;
use crate::state::UrlState;
use crate::{FailureKind, MirrorError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Why a URL did not make it to `Done`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&MirrorError> for Failure {
    fn from(error: &MirrorError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// What happened to one input URL
#[derive(Debug, Clone, Serialize)]
pub struct UrlOutcome {
    /// The URL exactly as it was given
    pub url: String,

    /// Final state reached in this run
    pub state: UrlState,

    /// HTML artifact, present once the page was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_path: Option<PathBuf>,

    /// Screenshot artifact, present once the image was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_path: Option<PathBuf>,

    /// Load time of the successful navigation
    #[serde(rename = "load_time_secs", skip_serializing_if = "Option::is_none")]
    pub load_time: Option<LoadTime>,

    /// Navigation attempts made
    pub attempts: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
}

impl UrlOutcome {
    /// An outcome for a URL that has not been processed yet
    pub fn pending(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: UrlState::Pending,
            saved_path: None,
            screenshot_path: None,
            load_time: None,
            attempts: 0,
            failure: None,
        }
    }
}

/// Structured result of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    /// SHA-256 of the effective configuration
    pub config_fingerprint: String,

    /// Set when a fatal error stopped the run early
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<Failure>,

    /// One entry per input URL, in input order
    pub outcomes: Vec<UrlOutcome>,
}

impl RunReport {
    /// Starts a report stamped with the current time
    pub fn new(config_fingerprint: impl Into<String>) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            config_fingerprint: config_fingerprint.into(),
            aborted: None,
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: UrlOutcome) {
        self.outcomes.push(outcome);
    }

    /// Stamps the finish time
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Marks the run as stopped by `error` and stamps the finish time
    pub fn abort(&mut self, error: &MirrorError) {
        self.aborted = Some(Failure::from(error));
        self.finish();
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of URLs that ended in `state`
    pub fn count(&self, state: UrlState) -> usize {
        self.outcomes.iter().filter(|o| o.state == state).count()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.state.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.state.is_error()).count()
    }

    /// Failure counts per kind
    pub fn failures_by_kind(&self) -> HashMap<FailureKind, usize> {
        let mut counts = HashMap::new();
        for failure in self.outcomes.iter().filter_map(|o| o.failure.as_ref()) {
            *counts.entry(failure.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Mean load time of the pages that loaded, in seconds
    pub fn average_load_time(&self) -> Option<f64> {
        let times: Vec<f64> = self
            .outcomes
            .iter()
            .filter_map(|o| o.load_time.map(|t| t.duration().as_secs_f64()))
            .collect();

        if times.is_empty() {
            None
        } else {
            Some(times.iter().sum::<f64>() / times.len() as f64)
        }
    }

    /// Percentage of URLs that reached `Done`
    pub fn success_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            0.0
        } else {
            (self.succeeded() as f64 / self.outcomes.len() as f64) * 100.0
        }
    }

    /// Whole seconds between start and finish, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Prints the run summary to stdout
    pub fn print_summary(&self) {
        println!("=== Mirror Summary ===\n");

        println!("Overview:");
        println!("  URLs processed: {}", self.total());
        if let Some(duration) = self.duration_seconds() {
            println!("  Duration: {}s", duration);
        }
        if let Some(average) = self.average_load_time() {
            println!("  Average load time: {:.2} seconds", average);
        }
        println!();

        println!("URLs by State:");
        for state in UrlState::all_states() {
            let count = self.count(state);
            if count > 0 {
                let percentage = (count as f64 / self.total() as f64) * 100.0;
                println!("  {}: {} ({:.1}%)", state, count, percentage);
            }
        }
        println!();

        let failures = self.failures_by_kind();
        if !failures.is_empty() {
            println!("Failure Summary:");
            let mut failure_counts: Vec<_> = failures.iter().collect();
            failure_counts.sort_by(|a, b| b.1.cmp(a.1));

            for (kind, count) in failure_counts {
                println!("  {}: {}", kind, count);
            }
            println!();

            println!("Failed URLs:");
            for outcome in self.outcomes.iter().filter(|o| o.state.is_error()) {
                if let Some(failure) = &outcome.failure {
                    println!("  - {} ({})", outcome.url, failure.message);
                }
            }
            println!();
        }

        if let Some(aborted) = &self.aborted {
            println!("Run aborted: {}", aborted.message);
            println!(
                "  {} URLs were not attempted",
                self.count(UrlState::Pending)
            );
            println!();
        }

        println!(
            "Success Rate: {:.1}% ({} / {} URLs saved)",
            self.success_rate(),
            self.succeeded(),
            self.total()
        );
    }

    /// Writes the report as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<(), MirrorError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| MirrorError::filesystem(path, e))
    }
}
