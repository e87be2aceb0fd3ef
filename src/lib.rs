//! Concurrent scraper for ekşisözlük-style forum threads.
//!
//! Given a thread slug, the scraper resolves the thread's page count from
//! page 1, fetches the remaining pages concurrently under a bounded
//! concurrency cap, extracts (author, timestamp, text) entries from the
//! markup, and writes one CSV or JSON file per thread.

pub mod cli;
pub mod config;
pub mod constants;
pub mod extract;
pub mod fetch;
pub mod output;
pub mod scrape;
