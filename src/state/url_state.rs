/// Per-URL state definitions for tracking a mirror run
///
/// Each URL walks `Pending -> Fetching -> (Fetched | FetchFailed)`, and a
/// fetched page continues `Fetched -> Persisting -> (Done | PersistFailed)`.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the current state of a URL in the mirror run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlState {
    // ===== Active States =====
    /// URL has not been looked at yet
    Pending,

    /// Page is being navigated to (including retries)
    Fetching,

    /// Page rendered and its DOM was captured
    Fetched,

    /// Artifacts are being written
    Persisting,

    // ===== Terminal Success State =====
    /// Artifacts were written successfully
    Done,

    // ===== Terminal Error States =====
    /// URL was malformed or navigation failed after all retries
    FetchFailed,

    /// Writing the artifacts failed
    PersistFailed,
}

impl UrlState {
    /// Returns true if the URL needs no further processing in this run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::FetchFailed | Self::PersistFailed)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if this represents a failed URL
    pub fn is_error(&self) -> bool {
        matches!(self, Self::FetchFailed | Self::PersistFailed)
    }

    /// Returns true if moving from this state to `next` is allowed
    pub fn can_transition_to(&self, next: UrlState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Fetching)
                | (Self::Fetching, Self::Fetched)
                | (Self::Fetching, Self::FetchFailed)
                | (Self::Fetched, Self::Persisting)
                | (Self::Persisting, Self::Done)
                | (Self::Persisting, Self::PersistFailed)
        )
    }

    /// Stable snake_case name used in reports and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Fetched => "fetched",
            Self::Persisting => "persisting",
            Self::Done => "done",
            Self::FetchFailed => "fetch_failed",
            Self::PersistFailed => "persist_failed",
        }
    }

    /// Returns all possible URL states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::Fetching,
            Self::Fetched,
            Self::Persisting,
            Self::Done,
            Self::FetchFailed,
            Self::PersistFailed,
        ]
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
