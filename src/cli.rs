//! Command-line interface.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::Config;
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "sozluk-scraper",
    version,
    about = "Scrape ekşisözlük threads to CSV or JSON files"
)]
pub struct Cli {
    /// Thread slugs to scrape: the URL path segment, without any ?p= suffix
    #[arg(short = 't', long = "threads", value_name = "SLUG", num_args = 1..)]
    pub threads: Vec<String>,

    /// Read additional thread slugs from a file, one per line
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Output file format
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Directory output files are written to (overrides OUTPUT_DIR)
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Maximum concurrent page requests (overrides MAX_CONCURRENT_REQUESTS)
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,
}

impl Cli {
    /// The combined thread list: `--threads` arguments first, then the lines
    /// of `--file` in file order. Blank lines and surrounding whitespace are
    /// dropped; duplicates are kept as given.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread file cannot be read.
    pub fn thread_list(&self) -> Result<Vec<String>> {
        let mut threads = self.threads.clone();
        if let Some(path) = &self.file {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read thread file: {}", path.display()))?;
            threads.extend(
                contents
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(String::from),
            );
        }
        Ok(threads)
    }

    /// Apply command-line overrides onto the environment-derived config.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(dir) = &self.output_dir {
            config.output_dir.clone_from(dir);
        }
        if let Some(concurrency) = self.concurrency {
            config.max_concurrent_requests = concurrency;
        }
    }
}
