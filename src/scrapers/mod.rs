//! Page loading and content extraction.
//!
//! The pipeline never talks to the network or parses HTML directly; it goes
//! through two capabilities:
//!
//! - [`PageFetcher`]: navigate to a URL, read the rendered HTML, and scroll
//!   to trigger lazily loaded content
//! - [`ContentExtractor`]: turn HTML into a Markdown body plus metadata
//!
//! # Implementations
//!
//! | Capability | Type | Backing crate |
//! |------------|------|---------------|
//! | [`PageFetcher`] | [`http::HttpFetcher`] | `reqwest` |
//! | [`ContentExtractor`] | [`extract::ReadableExtractor`] | `scraper` |

pub mod extract;
pub mod http;

use crate::models::PageMetadata;
use std::error::Error;
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Why a page could not be loaded.
#[derive(Debug)]
pub enum FetchError {
    /// Navigation exceeded its time budget.
    Timeout { url: String, after: Duration },
    /// The server answered with a non-success status.
    Status { url: String, status: u16 },
    /// Connection, TLS, or body decoding failure.
    Transport { url: String, message: String },
    /// `content()` was called before any successful `goto()`.
    NoPage,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Timeout { url, after } => {
                write!(f, "timed out after {}s loading {url}", after.as_secs())
            }
            FetchError::Status { url, status } => write!(f, "HTTP {status} from {url}"),
            FetchError::Transport { url, message } => write!(f, "failed loading {url}: {message}"),
            FetchError::NoPage => write!(f, "no page loaded"),
        }
    }
}

impl Error for FetchError {}

/// A browser-like page: one current document that can be replaced and scrolled.
pub trait PageFetcher {
    /// Load `url`, failing if it takes longer than `timeout`.
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), Box<dyn Error>>;

    /// HTML of the current document.
    async fn content(&self) -> Result<String, Box<dyn Error>>;

    /// Scroll to the bottom of the current document.
    async fn scroll_to_bottom(&mut self) -> Result<(), Box<dyn Error>>;

    /// Current scroll height of the document.
    async fn scroll_height(&self) -> Result<u64, Box<dyn Error>>;
}

/// Extracts readable content from HTML.
pub trait ContentExtractor {
    /// Markdown rendering of the main content, or `None` when nothing readable is found.
    fn extract(&self, html: &str) -> Option<String>;

    fn extract_metadata(&self, html: &str) -> PageMetadata;
}

/// Scroll repeatedly so infinite-scroll pages load more entries.
///
/// Runs at most `max_rounds` scroll-and-wait rounds and stops early once two
/// consecutive height readings are equal. Returns the number of rounds run.
pub async fn load_more<P: PageFetcher>(
    page: &mut P,
    max_rounds: usize,
    wait: Duration,
) -> Result<usize, Box<dyn Error>> {
    let mut previous_height = 0u64;
    let mut rounds = 0;

    while rounds < max_rounds {
        page.scroll_to_bottom().await?;
        rounds += 1;
        sleep(wait).await;

        let height = page.scroll_height().await?;
        if height == previous_height {
            break;
        }
        previous_height = height;
    }

    debug!(rounds, height = previous_height, "Finished scrolling");
    Ok(rounds)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Page whose height grows for `grow_for` scrolls, then stays put.
    struct GrowingPage {
        height: u64,
        grow_for: usize,
        scrolls: usize,
    }

    impl PageFetcher for GrowingPage {
        async fn goto(&mut self, _url: &str, _timeout: Duration) -> Result<(), Box<dyn Error>> {
            Ok(())
        }

        async fn content(&self) -> Result<String, Box<dyn Error>> {
            Ok(String::new())
        }

        async fn scroll_to_bottom(&mut self) -> Result<(), Box<dyn Error>> {
            self.scrolls += 1;
            if self.scrolls <= self.grow_for {
                self.height += 1000;
            }
            Ok(())
        }

        async fn scroll_height(&self) -> Result<u64, Box<dyn Error>> {
            Ok(self.height)
        }
    }

    #[tokio::test]
    async fn test_load_more_stops_when_height_settles() {
        let mut page = GrowingPage {
            height: 1000,
            grow_for: 3,
            scrolls: 0,
        };
        let rounds = load_more(&mut page, 10, Duration::ZERO).await.unwrap();
        // Heights read: 2000, 3000, 4000, 4000.
        assert_eq!(rounds, 4);
    }

    #[tokio::test]
    async fn test_load_more_respects_round_cap() {
        let mut page = GrowingPage {
            height: 0,
            grow_for: usize::MAX,
            scrolls: 0,
        };
        let rounds = load_more(&mut page, 10, Duration::ZERO).await.unwrap();
        assert_eq!(rounds, 10);
        assert_eq!(page.scrolls, 10);
    }

    #[test]
    fn test_fetch_error_display() {
        let e = FetchError::Timeout {
            url: "https://x.com".into(),
            after: Duration::from_secs(30),
        };
        assert_eq!(e.to_string(), "timed out after 30s loading https://x.com");
        let e = FetchError::Status {
            url: "https://x.com".into(),
            status: 404,
        };
        assert_eq!(e.to_string(), "HTTP 404 from https://x.com");
    }
}
