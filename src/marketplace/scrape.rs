//! Search-results page scraping.
//!
//! Extraction targets the result-card markup and breaks whenever the page
//! layout changes, which is why callers always get a synthetic list instead
//! of nothing.

use crate::marketplace::{FetchOutcome, MarketplaceError};
use crate::models::CompetitorListing;
use once_cell::sync::Lazy;
use rand::{Rng, SeedableRng, rngs::SmallRng};
use regex::Regex;
use reqwest::{Client, StatusCode};
use scraper::{ElementRef, Html, Selector};
use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};
use urlencoding::encode;

static CARD: Lazy<Selector> =
    Lazy::new(|| Selector::parse("li.ui-search-layout__item").expect("valid selector"));

static CARD_TITLE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".ui-search-item__title, .poly-component__title").expect("valid selector")
});

static PRICE_FRACTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".andes-money-amount__fraction").expect("valid selector"));

static SOLD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\+?\s*(\d+)\s*(mil)?\s+vendid[oa]s").expect("valid regex"));

const SYNTHETIC_COUNT: usize = 8;
const SYNTHETIC_VARIANTS: &[&str] = &[
    "Original",
    "Premium",
    "Kit Completo",
    "Profesional",
    "Universal",
    "Alta Calidad",
    "Con Garantia",
    "Envio Gratis",
];

#[derive(Clone)]
pub struct ScrapeClient {
    http: Client,
    base_url: String,
}

impl ScrapeClient {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn search(&self, phrase: &str, cap: usize) -> FetchOutcome<Vec<CompetitorListing>> {
        if phrase.trim().is_empty() {
            return FetchOutcome::NotFound;
        }
        match self.fetch_page(phrase).await {
            Ok(Some(html)) => FetchOutcome::Found(parse_search_page(&html, cap)),
            Ok(None) => FetchOutcome::NotFound,
            Err(err) => FetchOutcome::Error(err.to_string()),
        }
    }

    async fn fetch_page(&self, phrase: &str) -> Result<Option<String>, MarketplaceError> {
        let url = format!("{}/{}", self.base_url, page_slug(phrase));
        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(MarketplaceError::Status(response.status()));
        }
        Ok(Some(response.text().await?))
    }
}

fn page_slug(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(|word| encode(word).into_owned())
        .collect::<Vec<_>>()
        .join("-")
}

/// Result cards found in a search-results page, in page order.
///
/// Cards without a recognizable title are skipped; missing price or sold
/// count fall back to zero.
pub fn parse_search_page(html: &str, cap: usize) -> Vec<CompetitorListing> {
    let document = Html::parse_document(html);
    document
        .select(&CARD)
        .filter_map(parse_card)
        .take(cap)
        .collect()
}

fn parse_card(card: ElementRef<'_>) -> Option<CompetitorListing> {
    let title = card.select(&CARD_TITLE).next().map(element_text)?;
    if title.is_empty() {
        return None;
    }
    let price = card
        .select(&PRICE_FRACTION)
        .next()
        .map(element_text)
        .and_then(|fraction| fraction.replace('.', "").parse::<f64>().ok())
        .unwrap_or(0.0);
    Some(CompetitorListing {
        title,
        price,
        sold_quantity: sold_quantity(&element_text(card)),
    })
}

/// `+5mil vendidos` is 5000; counts too large for `u64` saturate.
fn sold_quantity(text: &str) -> u64 {
    SOLD.captures(text)
        .and_then(|caps| {
            let base = caps[1].parse::<u64>().ok()?;
            Some(if caps.get(2).is_some() {
                base.saturating_mul(1000)
            } else {
                base
            })
        })
        .unwrap_or(0)
}

/// Decoded text of an element with whitespace collapsed.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Deterministic stand-in listings built from the search phrase alone.
///
/// Prices and sold counts are seeded from the phrase, so equal phrases give
/// equal lists. Never empty for `cap >= 1`.
pub fn synthetic_competitors(phrase: &str, cap: usize) -> Vec<CompetitorListing> {
    let base = title_case(phrase.trim());
    let base = if base.is_empty() {
        "Producto".to_string()
    } else {
        base
    };
    let mut hasher = DefaultHasher::new();
    base.hash(&mut hasher);
    let mut rng = SmallRng::seed_from_u64(hasher.finish());

    SYNTHETIC_VARIANTS
        .iter()
        .take(SYNTHETIC_COUNT.min(cap))
        .map(|variant| CompetitorListing {
            title: format!("{base} {variant}"),
            price: (rng.random_range(5_000..150_000) / 10 * 10) as f64,
            sold_quantity: rng.random_range(0..500),
        })
        .collect()
}

fn title_case(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
