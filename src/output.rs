//! Serialization of scraped threads to per-thread output files.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::extract::Entry;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to serialize entries to CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to serialize entries to JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write output file: {0}")]
    Io(#[from] std::io::Error),
}

/// Output file format, selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Comma-separated values with an author,timestamp,text header row.
    Csv,
    /// Array of objects with author, timestamp and text fields.
    Json,
}

impl OutputFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Write one thread's entries to a file named after the thread.
///
/// The file is created (or overwritten) under `output_dir`; serialization
/// happens in memory first so a failed serialize never leaves a truncated
/// file behind.
///
/// # Errors
///
/// Returns an error if serialization or the file write fails.
pub async fn write_thread(
    output_dir: &Path,
    thread: &str,
    entries: &[Entry],
    format: OutputFormat,
) -> Result<PathBuf, OutputError> {
    let path = output_dir.join(output_filename(thread, format));
    let bytes = match format {
        OutputFormat::Csv => to_csv(entries)?,
        OutputFormat::Json => serde_json::to_vec_pretty(entries)?,
    };
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

/// Derive the output filename from a thread slug.
///
/// The slug's title part (before the trailing `--<id>`) becomes the file stem,
/// with hyphens restored to spaces and path-hostile characters stripped.
/// Slugs whose titles differ only in characters the site's slugging collapses
/// (accented vs unaccented spellings) map to the same filename; the last one
/// written wins.
#[must_use]
pub fn output_filename(thread: &str, format: OutputFormat) -> String {
    let title = thread.split("--").next().unwrap_or(thread);
    let stem: String = title
        .chars()
        .map(|c| if c == '-' { ' ' } else { c })
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '\0'))
        .collect();
    let stem = stem.trim();
    if stem.is_empty() {
        format!("thread.{}", format.extension())
    } else {
        format!("{stem}.{}", format.extension())
    }
}

fn to_csv(entries: &[Entry]) -> Result<Vec<u8>, OutputError> {
    let mut buf = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buf);
        if entries.is_empty() {
            // serialize() emits the header with the first record; an empty
            // thread still gets its header row.
            writer.write_record(["author", "timestamp", "text"])?;
        }
        for entry in entries {
            writer.serialize(entry)?;
        }
        writer.flush()?;
    }
    Ok(buf)
}
