//! Integration tests for the concurrent pagination driver.

use std::sync::Arc;
use std::time::{Duration, Instant};

use sozluk_scraper::config::Config;
use sozluk_scraper::scrape::scrape_thread;
use tokio::sync::Semaphore;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One entry item in the markup shape the site serves.
fn entry_html(author: &str, date: &str, text: &str) -> String {
    format!(
        r#"<li id="entry-item">
            <div class="content">{text}</div>
            <a class="entry-author">{author}</a>
            <a class="entry-date">{date}</a>
        </li>"#
    )
}

/// A full page: optional pager plus entry items.
fn page_html(page_count: Option<u32>, entries: &[(&str, &str, &str)]) -> String {
    let pager = page_count
        .map(|n| format!(r#"<div class="pager" data-pagecount="{n}"></div>"#))
        .unwrap_or_default();
    let items: String = entries
        .iter()
        .map(|(author, date, text)| entry_html(author, date, text))
        .collect();
    format!(r#"<html><body>{pager}<ul id="entry-item-list">{items}</ul></body></html>"#)
}

fn test_config(server: &MockServer) -> Config {
    Config {
        base_url: server.uri(),
        ..Config::for_testing()
    }
}

async fn mount_page(server: &MockServer, slug: &str, page: u32, body: String, delay_ms: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/{slug}")))
        .and(query_param("p", page.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .set_delay(Duration::from_millis(delay_ms)),
        )
        .mount(server)
        .await;
}

async fn mount_failing_page(server: &MockServer, slug: &str, page: u32, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/{slug}")))
        .and(query_param("p", page.to_string()))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

fn texts(entries: &[sozluk_scraper::extract::Entry]) -> Vec<&str> {
    entries.iter().map(|e| e.text.as_str()).collect()
}

#[tokio::test]
async fn single_page_thread_is_exactly_page_one() {
    let server = MockServer::start().await;
    let slug = "pena--31782";
    let body = page_html(
        None,
        &[
            ("ssg", "15.02.1999 21:00", "gitar calmak icin kullanilan minik plastik garip nesne"),
            ("otisabi", "16.02.1999 09:12", "penaya dair ikinci entry"),
        ],
    );
    mount_page(&server, slug, 1, body, 0).await;

    let config = test_config(&server);
    let client = sozluk_scraper::fetch::build_client(&config).unwrap();
    let limiter = Arc::new(Semaphore::new(config.max_concurrent_requests));

    let entries = scrape_thread(&client, &config, &limiter, slug)
        .await
        .expect("single-page thread should scrape");

    assert_eq!(
        texts(&entries),
        [
            "gitar calmak icin kullanilan minik plastik garip nesne",
            "penaya dair ikinci entry"
        ]
    );
}

#[tokio::test]
async fn entries_merge_in_page_order_despite_completion_order() {
    let server = MockServer::start().await;
    let slug = "rust--53496";

    let page1 = page_html(
        Some(3),
        &[("a1", "01.01.2024 10:00", "s1e1"), ("a2", "01.01.2024 11:00", "s1e2")],
    );
    let page2 = page_html(None, &[("a3", "02.01.2024 10:00", "s2e1")]);
    let page3 = page_html(None, &[("a4", "03.01.2024 10:00", "s3e1")]);

    mount_page(&server, slug, 1, page1, 0).await;
    // Page 2 finishes well after page 3; the merge must not care.
    mount_page(&server, slug, 2, page2, 300).await;
    mount_page(&server, slug, 3, page3, 0).await;

    let config = test_config(&server);
    let client = sozluk_scraper::fetch::build_client(&config).unwrap();
    let limiter = Arc::new(Semaphore::new(config.max_concurrent_requests));

    let entries = scrape_thread(&client, &config, &limiter, slug)
        .await
        .expect("all pages reachable");

    assert_eq!(texts(&entries), ["s1e1", "s1e2", "s2e1", "s3e1"]);
}

#[tokio::test]
async fn failed_middle_page_contributes_no_entries() {
    let server = MockServer::start().await;
    let slug = "kayip-sayfa--7";

    let page1 = page_html(Some(3), &[("a1", "", "s1e1")]);
    let page3 = page_html(None, &[("a3", "", "s3e1")]);
    mount_page(&server, slug, 1, page1, 0).await;
    mount_failing_page(&server, slug, 2, 500).await;
    mount_page(&server, slug, 3, page3, 0).await;

    let config = test_config(&server);
    let client = sozluk_scraper::fetch::build_client(&config).unwrap();
    let limiter = Arc::new(Semaphore::new(config.max_concurrent_requests));

    let entries = scrape_thread(&client, &config, &limiter, slug)
        .await
        .expect("losing a page after page 1 is not fatal");

    assert_eq!(texts(&entries), ["s1e1", "s3e1"]);
}

#[tokio::test]
async fn failed_first_page_is_fatal_for_that_thread_only() {
    let server = MockServer::start().await;
    mount_failing_page(&server, "olu-baslik--1", 1, 500).await;
    mount_page(
        &server,
        "canli-baslik--2",
        1,
        page_html(None, &[("a", "01.01.2024 09:00", "tek entry")]),
        0,
    )
    .await;

    let config = test_config(&server);
    let client = sozluk_scraper::fetch::build_client(&config).unwrap();
    let limiter = Arc::new(Semaphore::new(config.max_concurrent_requests));

    let dead = scrape_thread(&client, &config, &limiter, "olu-baslik--1").await;
    let err = dead.expect_err("unreachable page 1 must fail the thread");
    assert!(err.to_string().contains("olu-baslik--1"));

    // The other thread in the batch is unaffected.
    let alive = scrape_thread(&client, &config, &limiter, "canli-baslik--2")
        .await
        .expect("healthy thread still scrapes");
    assert_eq!(texts(&alive), ["tek entry"]);
}

#[tokio::test]
async fn transient_failure_is_retried() {
    let server = MockServer::start().await;
    let slug = "inatci-sayfa--9";

    mount_page(&server, slug, 1, page_html(Some(2), &[("a1", "", "s1e1")]), 0).await;

    // First attempt at page 2 gets throttled, the retry succeeds. The
    // exhausted mock stops matching, letting the success mock take over.
    Mock::given(method("GET"))
        .and(path(format!("/{slug}")))
        .and(query_param("p", "2"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, slug, 2, page_html(None, &[("a2", "", "s2e1")]), 0).await;

    let config = Config {
        max_retries: 3,
        ..test_config(&server)
    };
    let client = sozluk_scraper::fetch::build_client(&config).unwrap();
    let limiter = Arc::new(Semaphore::new(config.max_concurrent_requests));

    let entries = scrape_thread(&client, &config, &limiter, slug)
        .await
        .expect("retry should recover the page");

    assert_eq!(texts(&entries), ["s1e1", "s2e1"]);
}

#[tokio::test]
async fn concurrency_cap_bounds_in_flight_requests() {
    let server = MockServer::start().await;
    let slug = "yogun-baslik--4";
    let page_delay_ms = 200;
    let page_delay = Duration::from_millis(page_delay_ms);

    mount_page(&server, slug, 1, page_html(Some(7), &[("a1", "", "p1")]), 0).await;
    for page in 2..=7u32 {
        mount_page(
            &server,
            slug,
            page,
            page_html(None, &[("a", "", "entry")]),
            page_delay_ms,
        )
        .await;
    }

    let config = Config {
        max_concurrent_requests: 2,
        ..test_config(&server)
    };
    let client = sozluk_scraper::fetch::build_client(&config).unwrap();
    let limiter = Arc::new(Semaphore::new(config.max_concurrent_requests));

    let started = Instant::now();
    let entries = scrape_thread(&client, &config, &limiter, slug)
        .await
        .expect("all pages reachable");
    let elapsed = started.elapsed();

    assert_eq!(entries.len(), 7);
    // 6 delayed pages through 2 permits is at least 3 sequential rounds; much
    // less elapsed time would mean the cap was exceeded.
    assert!(
        elapsed >= page_delay * 3 - Duration::from_millis(50),
        "elapsed {elapsed:?} implies more than 2 pages in flight"
    );
}
