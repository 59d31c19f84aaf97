//! Configuration module for Sumi-Mirror
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Every key is optional; the CLI layers its flags over whatever the
//! file provides and validates the merged result.
//!
//! # Example
//!
//! ```no_run
//! use sumi_mirror::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mirror.toml")).unwrap();
//! println!("Retry budget: {}", config.navigation.retries);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, IdleConfig, IdleStrategy, NavigationConfig, OutputConfig, RunConfig,
    DEFAULT_RETRIES, DEFAULT_RETRY_INTERVAL_MS, DEFAULT_TIMEOUT_MS,
};

// Re-export parser functions
pub use parser::{
    config_fingerprint, load_config, load_url_list, parse_config, parse_url_list, read_config,
};
pub use validation::validate;
