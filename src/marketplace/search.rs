use crate::marketplace::{FetchOutcome, MarketplaceError};
use crate::models::CompetitorListing;
use reqwest::Client;
use serde::Deserialize;
use serde_with::{DefaultOnError, serde_as};
use urlencoding::encode;

#[derive(Clone)]
pub struct SearchClient {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

/// Fields decode independently; a malformed value reads as absent.
#[serde_as]
#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    title: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    price: Option<f64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    sold_quantity: Option<u64>,
}

impl SearchClient {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Structured search scoped to one site. Zero results is `Found(vec![])`.
    pub async fn search(
        &self,
        site: &str,
        phrase: &str,
        limit: usize,
    ) -> FetchOutcome<Vec<CompetitorListing>> {
        match self.request(site, phrase, limit).await {
            Ok(listings) => FetchOutcome::Found(listings),
            Err(MarketplaceError::Status(status)) if status == reqwest::StatusCode::NOT_FOUND => {
                FetchOutcome::NotFound
            }
            Err(err) => FetchOutcome::Error(err.to_string()),
        }
    }

    async fn request(
        &self,
        site: &str,
        phrase: &str,
        limit: usize,
    ) -> Result<Vec<CompetitorListing>, MarketplaceError> {
        let url = format!("{}/sites/{}/search", self.base_url, encode(site));
        let limit_param = limit.to_string();
        let response = self
            .http
            .get(url)
            .query(&[("q", phrase), ("limit", limit_param.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MarketplaceError::Status(response.status()));
        }

        let payload: SearchResponse = response
            .json()
            .await
            .map_err(|err| MarketplaceError::Decode(err.to_string()))?;

        Ok(payload
            .results
            .into_iter()
            .filter_map(|result| {
                let title = result.title?.trim().to_string();
                (!title.is_empty()).then(|| CompetitorListing {
                    title,
                    price: result.price.filter(|p| p.is_finite()).unwrap_or(0.0),
                    sold_quantity: result.sold_quantity.unwrap_or(0),
                })
            })
            .take(limit)
            .collect())
    }
}
