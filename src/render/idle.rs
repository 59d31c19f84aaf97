//! Network idle tracking
//!
//! A page counts as idle once no more than `max_inflight` requests have been
//! outstanding for a continuous quiet window. The tracker is fed request
//! events and timestamps by the session, which keeps it free of any browser
//! types and easy to test.

use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;

/// A network event observed on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    /// A request with this id was sent (redirects reuse the id)
    Started(String),
    /// The request with this id finished or failed
    Finished(String),
}

/// Counts in-flight requests and reports when the network went quiet
#[derive(Debug)]
pub struct IdleTracker {
    max_inflight: usize,
    quiet_window: Duration,
    inflight: HashSet<String>,
    quiet_since: Option<Instant>,
}

impl IdleTracker {
    /// Creates a tracker that starts out quiet at `now`
    pub fn new(max_inflight: usize, quiet_window: Duration, now: Instant) -> Self {
        Self {
            max_inflight,
            quiet_window,
            inflight: HashSet::new(),
            quiet_since: Some(now),
        }
    }

    /// Applies one network event observed at `now`
    pub fn record(&mut self, event: NetworkEvent, now: Instant) {
        match event {
            NetworkEvent::Started(id) => {
                self.inflight.insert(id);
            }
            NetworkEvent::Finished(id) => {
                self.inflight.remove(&id);
            }
        }

        if self.inflight.len() > self.max_inflight {
            self.quiet_since = None;
        } else if self.quiet_since.is_none() {
            self.quiet_since = Some(now);
        }
    }

    /// Number of requests currently outstanding
    pub fn inflight(&self) -> usize {
        self.inflight.len()
    }

    /// Returns true if the network has been quiet for the whole window
    pub fn is_idle(&self, now: Instant) -> bool {
        self.quiet_since
            .map_or(false, |since| now.saturating_duration_since(since) >= self.quiet_window)
    }

    /// Time left until the current quiet period satisfies the window
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.quiet_since.map(|since| {
            self.quiet_window
                .saturating_sub(now.saturating_duration_since(since))
        })
    }
}
