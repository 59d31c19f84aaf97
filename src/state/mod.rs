//! State module for tracking mirror progress
//!
//! # Components
//!
//! - `UrlState`: Tracks the state of each input URL (pending, fetching, done, etc.)

mod url_state;

pub use url_state::UrlState;
