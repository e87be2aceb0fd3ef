//! Tolerant extraction of entries and pagination data from thread markup.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// One user-authored entry in a thread.
///
/// Field order is the serialization order: CSV columns and JSON keys both come
/// out as author, timestamp, text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub author: String,
    pub timestamp: String,
    pub text: String,
}

/// Extract all entries from one page of thread markup, in document order.
///
/// Extraction is best-effort at entry granularity: an entry missing its
/// content or author is skipped and the rest of the page is still extracted.
/// A missing date node yields an empty timestamp. Nested markup inside the
/// content (links, paragraph breaks) is flattened to its visible text, with no
/// whitespace inserted between fragments.
#[must_use]
pub fn extract_entries(html: &str) -> Vec<Entry> {
    let document = Html::parse_document(html);
    let entry_selector = Selector::parse("#entry-item").expect("valid selector");
    let content_selector = Selector::parse(".content").expect("valid selector");
    let author_selector = Selector::parse(".entry-author").expect("valid selector");
    let date_selector = Selector::parse(".entry-date").expect("valid selector");

    let mut entries = Vec::new();
    for item in document.select(&entry_selector) {
        let Some(text) = child_text(item, &content_selector) else {
            trace!("Skipping entry without content");
            continue;
        };
        let Some(author) = child_text(item, &author_selector) else {
            trace!("Skipping entry without author");
            continue;
        };
        let timestamp = child_text(item, &date_selector)
            .map(|raw| creation_timestamp(&raw))
            .unwrap_or_default();

        entries.push(Entry {
            author,
            timestamp,
            text,
        });
    }
    entries
}

/// Total page count of a thread, read from the pager control on page 1.
///
/// A page without a pager (or with an unreadable page count) is a one-page
/// thread, never an error.
#[must_use]
pub fn page_count(html: &str) -> u32 {
    let document = Html::parse_document(html);
    let pager_selector = Selector::parse("div.pager").expect("valid selector");
    document
        .select(&pager_selector)
        .next()
        .and_then(|pager| pager.value().attr("data-pagecount"))
        .and_then(|count| count.trim().parse().ok())
        .filter(|&count| count >= 1)
        .unwrap_or(1)
}

/// Trimmed text of the first descendant matching `selector`, flattened across
/// nested elements. `None` when the element is missing or its text is empty.
fn child_text(item: ElementRef, selector: &Selector) -> Option<String> {
    let text: String = item.select(selector).next()?.text().collect();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// The site renders edited entries as `"<created> ~ <edited>"`; only the
/// creation time is kept.
fn creation_timestamp(raw: &str) -> String {
    raw.split('~').next().unwrap_or(raw).trim().to_string()
}
