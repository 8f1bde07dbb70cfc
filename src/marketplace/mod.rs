//! Outbound marketplace reads: item lookup and competitor search.
//!
//! Every call is a single attempt bounded by the shared client timeout. Faults
//! never leave this module as errors; they fold into [`FetchOutcome`] or an
//! empty/synthetic competitor list.

pub mod items;
pub mod scrape;
pub mod search;

use crate::config::{AppConfig, CompetitorSourceKind};
use crate::models::CompetitorListing;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

pub use items::ItemsClient;
pub use scrape::ScrapeClient;
pub use search::SearchClient;

#[derive(Debug, Error)]
pub enum MarketplaceError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for MarketplaceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Request(format!("timed out: {err}"))
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

/// Result of one outbound read.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Found(T),
    NotFound,
    Error(String),
}

impl<T> FetchOutcome<T> {
    pub fn label(&self) -> &'static str {
        match self {
            FetchOutcome::Found(_) => "found",
            FetchOutcome::NotFound => "not_found",
            FetchOutcome::Error(_) => "error",
        }
    }
}

/// Where competitor listings come from. Callers only ever see the listings.
#[derive(Clone)]
pub enum CompetitorSource {
    Api(SearchClient),
    Html(ScrapeClient),
}

impl CompetitorSource {
    pub fn from_config(config: &AppConfig, http: Client) -> Self {
        match config.competitor_source {
            CompetitorSourceKind::Api => Self::Api(SearchClient::new(http, &config.api_base)),
            CompetitorSourceKind::Html => {
                Self::Html(ScrapeClient::new(http, &config.listing_base))
            }
        }
    }

    /// Up to `cap` listings comparable to `phrase`.
    ///
    /// The structured search degrades to an empty list; the HTML path degrades
    /// to synthetic listings so it never returns empty.
    pub async fn fetch(&self, phrase: &str, site: &str, cap: usize) -> Vec<CompetitorListing> {
        let mut listings = match self {
            CompetitorSource::Api(client) => {
                if phrase.trim().is_empty() {
                    debug!(target = "seo.marketplace", "empty search phrase, skipping search");
                    return Vec::new();
                }
                let outcome = client.search(site, phrase, cap).await;
                crate::metrics::fetch_outcome("search", outcome.label());
                match outcome {
                    FetchOutcome::Found(listings) => listings,
                    FetchOutcome::NotFound => Vec::new(),
                    FetchOutcome::Error(reason) => {
                        warn!(target = "seo.marketplace", site, phrase, error = %reason, "competitor_search_failed");
                        Vec::new()
                    }
                }
            }
            CompetitorSource::Html(client) => {
                let outcome = client.search(phrase, cap).await;
                crate::metrics::fetch_outcome("search_page", outcome.label());
                match outcome {
                    FetchOutcome::Found(listings) if !listings.is_empty() => listings,
                    other => {
                        if let FetchOutcome::Error(reason) = &other {
                            warn!(target = "seo.marketplace", phrase, error = %reason, "search_page_failed");
                        }
                        debug!(target = "seo.marketplace", phrase, "using synthetic competitors");
                        scrape::synthetic_competitors(phrase, cap)
                    }
                }
            }
        };
        listings.truncate(cap);
        listings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_http() -> Client {
        Client::builder()
            .timeout(Duration::from_millis(500))
            .build()
            .expect("client")
    }

    #[tokio::test]
    async fn api_source_caps_results() {
        let server = MockServer::start().await;
        let results: Vec<_> = (0..30)
            .map(|i| json!({"title": format!("Lente {i}"), "price": 100.0 + i as f64, "sold_quantity": i}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/sites/MLA/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": results})))
            .mount(&server)
            .await;

        let source = CompetitorSource::Api(SearchClient::new(test_http(), &server.uri()));
        let listings = source.fetch("lente", "MLA", 20).await;
        assert_eq!(listings.len(), 20);
        assert_eq!(listings[0].title, "Lente 0");
    }

    #[tokio::test]
    async fn api_source_degrades_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let source = CompetitorSource::Api(SearchClient::new(test_http(), &server.uri()));
        assert!(source.fetch("lente", "MLA", 20).await.is_empty());
        assert!(source.fetch("  ", "MLA", 20).await.is_empty());
    }

    #[tokio::test]
    async fn html_source_degrades_to_synthetic() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>captcha</html>"))
            .mount(&server)
            .await;
        let source = CompetitorSource::Html(ScrapeClient::new(test_http(), &server.uri()));
        let listings = source.fetch("lente macro", "MLA", 4).await;
        assert_eq!(listings.len(), 4);
        assert!(listings.iter().all(|l| l.title.starts_with("Lente Macro")));
    }
}
