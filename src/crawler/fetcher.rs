//! Page fetching capability
//!
//! The search results site renders its cards client-side, so a plain GET may
//! come back before any card markup exists. The fetcher abstracts that away:
//! callers name the selector they are waiting for and a deadline, and get
//! back either the rendered document or a timeout signal. The crawl loop
//! treats the timeout as a block/redirect indication, not an error.

use crate::config::UserAgentConfig;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Result of waiting for a page to render
#[derive(Debug)]
pub enum FetchOutcome {
    /// The document, captured once the wait selector matched
    Rendered(String),

    /// The selector never appeared within the deadline
    Timeout,
}

/// Capability for fetching a rendered page
///
/// Implementations must return `Rendered` only once at least one element
/// matches `wait_selector`, and `Timeout` once the deadline passes.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        wait_selector: &str,
        timeout: Duration,
    ) -> crate::Result<FetchOutcome>;
}

/// Forwards through an `Arc` so shared fetchers can be passed by handle
#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for Arc<T> {
    async fn fetch(
        &self,
        url: &str,
        wait_selector: &str,
        timeout: Duration,
    ) -> crate::Result<FetchOutcome> {
        T::fetch(self, url, wait_selector, timeout).await
    }
}

/// Builds an HTTP client with proper configuration
///
/// User agent format: CrawlerName/Version (+ContactURL; ContactEmail)
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// HTTP-polling page fetcher
///
/// Re-requests the URL until the wait selector shows up in the body or the
/// deadline passes. Transient request failures and non-success statuses
/// count as "not rendered yet" and are retried within the same deadline.
pub struct HttpPageFetcher {
    client: Client,
    poll_interval: Duration,
}

impl HttpPageFetcher {
    pub fn new(config: &UserAgentConfig) -> crate::Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
            poll_interval: Duration::from_secs(2),
        })
    }

    /// Overrides the delay between render checks
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(
        &self,
        url: &str,
        wait_selector: &str,
        timeout: Duration,
    ) -> crate::Result<FetchOutcome> {
        let deadline = Instant::now() + timeout;

        loop {
            match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => {
                    match response.text().await {
                        Ok(body) if selector_present(&body, wait_selector) => {
                            return Ok(FetchOutcome::Rendered(body));
                        }
                        Ok(_) => {
                            tracing::debug!("'{}' not present yet on {}", wait_selector, url);
                        }
                        Err(e) => {
                            tracing::debug!("Failed to read body from {}: {}", url, e);
                        }
                    }
                }
                Ok(response) => {
                    tracing::debug!("HTTP {} from {}", response.status(), url);
                }
                Err(e) => {
                    tracing::debug!("Request to {} failed: {}", url, e);
                }
            }

            if Instant::now() + self.poll_interval >= deadline {
                return Ok(FetchOutcome::Timeout);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Checks whether a CSS selector matches anywhere in the document
fn selector_present(html: &str, selector: &str) -> bool {
    let Ok(selector) = Selector::parse(selector) else {
        return false;
    };
    Html::parse_document(html).select(&selector).next().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_user_agent() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "test-bot".to_string(),
            crawler_version: "0.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        }
    }

    fn test_fetcher() -> HttpPageFetcher {
        HttpPageFetcher::new(&test_user_agent())
            .unwrap()
            .with_poll_interval(Duration::from_millis(50))
    }

    #[test]
    fn test_selector_present() {
        let html = r#"<html><body><div class="mb-srp__card">x</div></body></html>"#;
        assert!(selector_present(html, "div.mb-srp__card"));
        assert!(!selector_present(html, "div.missing"));
        assert!(!selector_present(html, "not a selector!!"));
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&test_user_agent()).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_returns_rendered_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><body><div class="mb-srp__card">card</div></body></html>"#,
            ))
            .mount(&server)
            .await;

        let outcome = test_fetcher()
            .fetch(
                &format!("{}/search", server.uri()),
                "div.mb-srp__card",
                Duration::from_secs(2),
            )
            .await
            .unwrap();

        match outcome {
            FetchOutcome::Rendered(body) => assert!(body.contains("mb-srp__card")),
            FetchOutcome::Timeout => panic!("expected a rendered document"),
        }
    }

    #[tokio::test]
    async fn test_fetch_times_out_when_selector_never_appears() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body>interstitial</body></html>"),
            )
            .mount(&server)
            .await;

        let outcome = test_fetcher()
            .fetch(
                &format!("{}/search", server.uri()),
                "div.mb-srp__card",
                Duration::from_millis(300),
            )
            .await
            .unwrap();

        assert!(matches!(outcome, FetchOutcome::Timeout));
    }

    #[tokio::test]
    async fn test_fetch_treats_http_errors_as_not_rendered() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let outcome = test_fetcher()
            .fetch(
                &format!("{}/search", server.uri()),
                "div.mb-srp__card",
                Duration::from_millis(300),
            )
            .await
            .unwrap();

        assert!(matches!(outcome, FetchOutcome::Timeout));
    }
}
