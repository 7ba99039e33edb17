//! Page fetching abstraction
//!
//! The scrape pipeline only needs "give me the body of this URL, or nothing".
//! A failed page never aborts the pipeline, so implementations swallow every
//! network error and non-200 status and report it through logging instead.

use reqwest::{Client as HttpClient, StatusCode};

use crate::error::AppResult;

/// Trait for fetching one page of the source site
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    /// Returns the page body, or `None` on any network failure or non-200 status
    async fn fetch_page(&self, url: &str) -> Option<String>;
}

/// reqwest-backed fetcher that identifies itself as a browser
#[derive(Clone)]
pub struct HttpPageFetcher {
    http_client: HttpClient,
}

impl HttpPageFetcher {
    pub fn new(user_agent: &str) -> AppResult<Self> {
        let http_client = HttpClient::builder().user_agent(user_agent).build()?;
        Ok(Self { http_client })
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, url: &str) -> Option<String> {
        let response = match self.http_client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Page fetch failed");
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            tracing::warn!(url = %url, status = %response.status(), "Page fetch returned non-200");
            return None;
        }

        match response.text().await {
            Ok(body) => {
                tracing::debug!(url = %url, bytes = body.len(), "Page fetched");
                Some(body)
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Failed to read page body");
                None
            }
        }
    }
}
