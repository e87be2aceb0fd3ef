//! Shared constants used across the application.

/// Default site root. Overridable via `SOZLUK_BASE_URL`; the site moves
/// between mirror domains when the primary one is blocked.
pub const DEFAULT_BASE_URL: &str = "https://eksisozluk.com/";

/// User agent sent with every page request.
///
/// A realistic browser user agent; the site serves a stripped-down page to
/// clients that do not look like a browser.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Accept header matching a browser page navigation.
pub const ACCEPT_HEADER: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
