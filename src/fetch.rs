//! Single-page HTTP fetching.

use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

use crate::config::Config;
use crate::constants::{ACCEPT_HEADER, BROWSER_USER_AGENT};

/// Failure to retrieve one page of a thread.
///
/// Carries the thread and page number so callers can report or skip the page
/// without extra bookkeeping. Retry policy belongs to the caller; see
/// [`FetchError::is_retryable`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid page URL for '{thread}' page {page}: {source}")]
    Url {
        thread: String,
        page: u32,
        #[source]
        source: url::ParseError,
    },

    #[error("request for '{thread}' page {page} failed: {source}")]
    Request {
        thread: String,
        page: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("'{thread}' page {page} returned status {status}")]
    Status {
        thread: String,
        page: u32,
        status: StatusCode,
    },
}

impl FetchError {
    /// Whether a retry could plausibly succeed: timeouts, connection failures,
    /// throttling and server-side errors. Anything else is permanent.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Url { .. } => false,
            Self::Request { source, .. } => source.is_timeout() || source.is_connect(),
            Self::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
        }
    }
}

/// Build the HTTP client shared by every page request.
///
/// # Errors
///
/// Returns an error if the TLS backend fails to initialize.
pub fn build_client(config: &Config) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(config.request_timeout)
        .user_agent(BROWSER_USER_AGENT)
        .build()
}

/// Fetch the markup of one page of a thread. Pages are numbered from 1.
///
/// Exactly one GET per call; no internal retry.
///
/// # Errors
///
/// Returns a [`FetchError`] on transport errors and non-success statuses.
pub async fn fetch_page(
    client: &reqwest::Client,
    config: &Config,
    thread: &str,
    page: u32,
) -> Result<String, FetchError> {
    let url = page_url(&config.base_url, thread, page).map_err(|source| FetchError::Url {
        thread: thread.to_string(),
        page,
        source,
    })?;

    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, ACCEPT_HEADER)
        .send()
        .await
        .map_err(|source| FetchError::Request {
            thread: thread.to_string(),
            page,
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            thread: thread.to_string(),
            page,
            status,
        });
    }

    response.text().await.map_err(|source| FetchError::Request {
        thread: thread.to_string(),
        page,
        source,
    })
}

/// Address of one page of a thread: `{base}/{slug}?p={page}`.
fn page_url(base: &str, thread: &str, page: u32) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base)?.join(thread)?;
    url.set_query(Some(&format!("p={page}")));
    Ok(url)
}
