//! Concurrent pagination driver: one thread slug in, ordered entries out.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::extract::{extract_entries, page_count, Entry};
use crate::fetch::{fetch_page, FetchError};

/// Fatal per-thread failure: page 1 is unreachable, so neither the page count
/// nor any entries can be determined.
#[derive(Debug, Error)]
#[error("could not resolve page count for '{thread}': {source}")]
pub struct PageCountError {
    pub thread: String,
    #[source]
    pub source: FetchError,
}

/// Scrape every page of one thread into a single ordered entry list.
///
/// Page 1 is fetched first; its response yields both the page count and the
/// first page's entries. Pages 2..N are then fetched concurrently, each task
/// gated by `limiter` so no more than its permit count of requests are in
/// flight at once. The merged result is ordered strictly by page number
/// regardless of completion order. A page that still fails after retries is
/// logged and contributes no entries.
///
/// # Errors
///
/// Returns [`PageCountError`] when page 1 cannot be fetched; no page tasks are
/// dispatched in that case.
pub async fn scrape_thread(
    client: &reqwest::Client,
    config: &Config,
    limiter: &Arc<Semaphore>,
    thread: &str,
) -> Result<Vec<Entry>, PageCountError> {
    let first = fetch_page_with_retry(client, config, limiter, thread, 1)
        .await
        .map_err(|source| PageCountError {
            thread: thread.to_string(),
            source,
        })?;

    let pages = page_count(&first);
    let mut entries = extract_entries(&first);
    info!(thread = %thread, pages, "Resolved page count");

    if pages == 1 {
        return Ok(entries);
    }

    let mut handles = Vec::with_capacity(pages as usize - 1);
    for page in 2..=pages {
        let client = client.clone();
        let config = config.clone();
        let limiter = Arc::clone(limiter);
        let thread = thread.to_string();
        handles.push(tokio::spawn(async move {
            let result = fetch_page_with_retry(&client, &config, &limiter, &thread, page).await;
            (page, result.map(|markup| extract_entries(&markup)))
        }));
    }

    // Collect in whatever order tasks finish, then restore page order before
    // concatenating.
    let mut fetched = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok((page, Ok(page_entries))) => fetched.push((page, page_entries)),
            Ok((page, Err(e))) => {
                warn!(thread = %thread, page, "Skipping page after fetch failure: {e}");
            }
            Err(e) => {
                warn!(thread = %thread, "Page task panicked: {e}");
            }
        }
    }
    fetched.sort_unstable_by_key(|&(page, _)| page);
    for (_, page_entries) in fetched {
        entries.extend(page_entries);
    }

    Ok(entries)
}

/// Fetch one page, retrying transient failures with exponential backoff.
///
/// The concurrency permit is held only while the request is in flight, not
/// across backoff sleeps, so a page stuck in retries never pins the cap.
async fn fetch_page_with_retry(
    client: &reqwest::Client,
    config: &Config,
    limiter: &Semaphore,
    thread: &str,
    page: u32,
) -> Result<String, FetchError> {
    let mut delay = config.retry_initial_delay;
    let mut attempt = 0u32;
    loop {
        let result = {
            let _permit = limiter
                .acquire()
                .await
                .expect("semaphore closed unexpectedly");
            fetch_page(client, config, thread, page).await
        };
        match result {
            Ok(markup) => return Ok(markup),
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                attempt += 1;
                debug!(thread = %thread, page, attempt, "Retrying after transient fetch error: {e}");
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(e) => return Err(e),
        }
    }
}
