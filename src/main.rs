use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::Semaphore;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sozluk_scraper::cli::Cli;
use sozluk_scraper::config::Config;
use sozluk_scraper::fetch;
use sozluk_scraper::output::{write_thread, OutputFormat};
use sozluk_scraper::scrape::scrape_thread;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    let threads = cli.thread_list()?;
    if threads.is_empty() {
        println!("No threads provided, exiting.");
        return Ok(());
    }

    let mut config = Config::from_env().context("Failed to load configuration")?;
    cli.apply_to(&mut config);
    config.validate().context("Invalid configuration")?;

    info!(
        base_url = %config.base_url,
        threads = threads.len(),
        format = %cli.format,
        concurrency = config.max_concurrent_requests,
        "Starting scrape"
    );

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create output directory: {}",
                config.output_dir.display()
            )
        })?;

    let client = fetch::build_client(&config).context("Failed to build HTTP client")?;
    // One cap for the whole run: page fetches of concurrently-processed
    // threads all draw from the same permit pool.
    let limiter = Arc::new(Semaphore::new(config.max_concurrent_requests));
    let format = cli.format;
    let started = Instant::now();

    let mut handles = Vec::with_capacity(threads.len());
    for thread in threads {
        let client = client.clone();
        let config = config.clone();
        let limiter = Arc::clone(&limiter);
        let task_thread = thread.clone();
        handles.push((
            thread,
            tokio::spawn(async move {
                process_thread(&client, &config, &limiter, &task_thread, format).await
            }),
        ));
    }

    let total = handles.len();
    let mut failed = 0usize;
    for (thread, handle) in handles {
        match handle.await {
            Ok(Ok((path, count))) => {
                info!(thread = %thread, entries = count, path = %path.display(), "Thread written");
            }
            Ok(Err(e)) => {
                error!(thread = %thread, "Thread failed: {e:#}");
                failed += 1;
            }
            Err(e) => {
                error!(thread = %thread, "Thread task panicked: {e}");
                failed += 1;
            }
        }
    }

    info!(
        total,
        failed,
        elapsed_secs = started.elapsed().as_secs_f64(),
        "Run complete"
    );

    if failed > 0 {
        anyhow::bail!("{failed} of {total} thread(s) failed");
    }
    Ok(())
}

/// Scrape one thread and write its output file.
///
/// Both steps are fatal for this thread only; the caller decides what a
/// failure means for the batch.
async fn process_thread(
    client: &reqwest::Client,
    config: &Config,
    limiter: &Arc<Semaphore>,
    thread: &str,
    format: OutputFormat,
) -> Result<(PathBuf, usize)> {
    let entries = scrape_thread(client, config, limiter, thread).await?;
    let path = write_thread(&config.output_dir, thread, &entries, format)
        .await
        .with_context(|| format!("Failed to write output for '{thread}'"))?;
    Ok((path, entries.len()))
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sozluk_scraper=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}
