//! News site scraping.
//!
//! Scraping follows a two-phase pattern:
//!
//! 1. **Indexing**: discover article URLs on a listing page
//! 2. **Fetching**: download each URL and extract title and body text
//!
//! Pages are downloaded through the [`PageFetch`] trait so the pipeline can be
//! driven by [`HttpFetcher`] in production and by canned pages in tests.
//! The site-specific parsing lives in [`cnn`].

pub mod cnn;

use crate::error::{DigestError, Result};
use reqwest::{Client, StatusCode};
use std::time::Instant;
use tracing::{debug, instrument};

/// Trait for downloading one HTML page as text.
pub trait PageFetch {
    async fn fetch_page(&self, url: &str) -> Result<String>;
}

/// [`PageFetch`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

impl PageFetch for HttpFetcher {
    #[instrument(level = "info", skip(self))]
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let t0 = Instant::now();
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(DigestError::Api {
                status: status.as_u16(),
                body: format!("GET {url}"),
            });
        }
        let html = response.text().await?;
        debug!(bytes = html.len(), elapsed_ms = t0.elapsed().as_millis(), "Fetched page");
        Ok(html)
    }
}

/// Keep the links whose raw text contains `token`, in their original order.
pub fn filter_links<S: AsRef<str>>(links: &[S], token: &str) -> Vec<String> {
    links
        .iter()
        .map(AsRef::as_ref)
        .filter(|link| link.contains(token))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::{local_client, StubServer};

    fn links() -> Vec<&'static str> {
        vec![
            "/2023/01/05/investing/stocks-week-ahead/index.html",
            "/markets",
            "/2022/12/30/economy/recap/index.html",
            "https://edition.cnn.com/2023/01/06/business/jobs-report/index.html",
            "#",
            "/videos/2023-highlights",
        ]
    }

    #[test]
    fn test_filter_keeps_only_matching_links_in_order() {
        let filtered = filter_links(&links(), "2023");
        assert_eq!(
            filtered,
            vec![
                "/2023/01/05/investing/stocks-week-ahead/index.html",
                "https://edition.cnn.com/2023/01/06/business/jobs-report/index.html",
                "/videos/2023-highlights",
            ]
        );
    }

    #[test]
    fn test_filter_is_idempotent() {
        let once = filter_links(&links(), "2023");
        let twice = filter_links(&once, "2023");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_filter_output_is_subsequence() {
        let input = links();
        let filtered = filter_links(&input, "/20");

        let mut rest = input.iter();
        for link in &filtered {
            assert!(link.contains("/20"));
            assert!(rest.any(|l| l == link), "{link} out of order");
        }
    }

    #[test]
    fn test_filter_without_matches_is_empty() {
        assert!(filter_links(&links(), "1999").is_empty());
        assert!(filter_links::<&str>(&[], "2023").is_empty());
    }

    #[tokio::test]
    async fn test_http_fetcher_returns_page_text() {
        let html = "<html><head><title>Markets</title></head><body></body></html>";
        let server = StubServer::reply(200, html).await;
        let fetcher = HttpFetcher::new(local_client());

        let page = fetcher.fetch_page(&server.url("/markets")).await.unwrap();
        assert_eq!(page, html);

        let received = server.received().await;
        assert!(received.request_line.starts_with("GET /markets "));
    }

    #[tokio::test]
    async fn test_http_fetcher_error_status_is_api_error() {
        for (status, transient) in [(404, false), (503, true)] {
            let server = StubServer::reply(status, "oops").await;
            let fetcher = HttpFetcher::new(local_client());
            let url = server.url("/2023/gone");

            let err = fetcher.fetch_page(&url).await.unwrap_err();
            match &err {
                DigestError::Api { status: got, body } => {
                    assert_eq!(*got, status);
                    assert!(body.contains(&url));
                }
                other => panic!("expected Api error for {status}, got {other:?}"),
            }
            assert_eq!(err.is_transient(), transient, "status {status}");
        }
    }

    #[tokio::test]
    async fn test_http_fetcher_connection_refused_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = HttpFetcher::new(local_client());
        let err = fetcher.fetch_page(&format!("http://{addr}/")).await.unwrap_err();
        assert!(matches!(err, DigestError::Transport(_)));
        assert!(err.is_transient());
    }
}
