//! [`PageFetcher`] over plain HTTP.
//!
//! Only the document itself is requested, so images, fonts, stylesheets and
//! media are never downloaded. There is no script execution: scrolling is a
//! no-op and the scroll height is the document length, so
//! [`super::load_more`] stops as soon as it reads the same height twice.

use super::{FetchError, PageFetcher};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::Client;
use std::error::Error;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    current: Option<String>,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;
        Ok(Self {
            client,
            current: None,
        })
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), Box<dyn Error>> {
        self.current = None;
        let t0 = Instant::now();

        let classify = |e: reqwest::Error| -> FetchError {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    after: timeout,
                }
            } else {
                FetchError::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        };

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Box::new(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }));
        }

        let body = response.text().await.map_err(classify)?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Loaded page"
        );
        self.current = Some(body);
        Ok(())
    }

    async fn content(&self) -> Result<String, Box<dyn Error>> {
        self.current
            .clone()
            .ok_or_else(|| Box::new(FetchError::NoPage) as Box<dyn Error>)
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), Box<dyn Error>> {
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64, Box<dyn Error>> {
        Ok(self.current.as_ref().map_or(0, |c| c.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::load_more;

    #[tokio::test]
    async fn test_content_before_goto_fails() {
        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher.content().await.unwrap_err();
        assert_eq!(err.to_string(), "no page loaded");
    }

    #[tokio::test]
    async fn test_load_more_settles_immediately() {
        let mut fetcher = HttpFetcher::new().unwrap();
        fetcher.current = Some("<html></html>".to_string());
        let rounds = load_more(&mut fetcher, 10, Duration::ZERO).await.unwrap();
        // First reading differs from the initial zero, the second one matches.
        assert_eq!(rounds, 2);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let mut fetcher = HttpFetcher::new().unwrap();
        let err = fetcher
            .goto("http://127.0.0.1:9/nothing", Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<FetchError>().is_some());
        assert!(fetcher.content().await.is_err());
    }
}
