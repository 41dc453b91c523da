//! Integration tests for Fairway Scout
//!
//! These tests use wiremock to stand up course websites and drive the
//! full pipeline: robots.txt gate, pacing, static fetching and extraction.

mod common;
mod output_tests;
mod policy_tests;
mod scrape_tests;
