//! Output module for writing mirror artifacts and run reports
//!
//! This module handles:
//! - Mapping URLs onto the output tree and writing rendered HTML
//! - Writing full-page screenshots
//! - Recording per-URL outcomes and summarizing the run

mod persister;
mod report;

pub use persister::{PersistedArtifact, SitePersister};
pub use report::{Failure, RunReport, UrlOutcome};
