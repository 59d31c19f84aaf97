//! Crawler module for rendering and mirroring pages
//!
//! This module contains the core run logic, including:
//! - Bounded retry with a fixed interval
//! - Page fetching with idle detection and load timing
//! - Overall run coordination

mod coordinator;
mod fetcher;
mod retry;

pub use coordinator::{run_mirror, Coordinator, RunAborted};
pub use fetcher::{fetch, navigation_policy, FetchFailure, FetchedPage, LoadTime};
pub use retry::{execute, execute_if, RetryPolicy};
