use crate::marketplace::{FetchOutcome, MarketplaceError};
use crate::models::ListingSnapshot;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use urlencoding::encode;

#[derive(Clone)]
pub struct ItemsClient {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ItemResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default, alias = "plain_text")]
    description: Option<String>,
}

impl ItemsClient {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Looks up a listing by canonical identifier. Single attempt.
    pub async fn fetch_listing(&self, item_id: &str) -> FetchOutcome<ListingSnapshot> {
        match self.request(item_id).await {
            Ok(Some(item)) => FetchOutcome::Found(snapshot_from_item(item_id, item)),
            Ok(None) => FetchOutcome::NotFound,
            Err(err) => FetchOutcome::Error(err.to_string()),
        }
    }

    async fn request(&self, item_id: &str) -> Result<Option<ItemResponse>, MarketplaceError> {
        let url = format!("{}/items/{}", self.base_url, encode(item_id));
        let response = self.http.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(MarketplaceError::Status(response.status()));
        }

        response
            .json::<ItemResponse>()
            .await
            .map(Some)
            .map_err(|err| MarketplaceError::Decode(err.to_string()))
    }
}

fn snapshot_from_item(item_id: &str, item: ItemResponse) -> ListingSnapshot {
    ListingSnapshot {
        id: item_id.to_string(),
        title: non_blank(item.title).unwrap_or_else(|| ListingSnapshot::DEFAULT_TITLE.into()),
        price: item
            .price
            .filter(|p| p.is_finite())
            .map(|p| p.round() as i64)
            .unwrap_or(0),
        description: non_blank(item.description)
            .unwrap_or_else(|| ListingSnapshot::DEFAULT_DESCRIPTION.into()),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
