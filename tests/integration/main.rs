//! Integration tests for the mirror pipeline
//!
//! The pipeline tests drive the coordinator with a scripted render session;
//! the Chromium tests serve pages from wiremock to a real browser.

mod chrome_tests;
mod pipeline_tests;
