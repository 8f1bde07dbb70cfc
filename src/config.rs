use std::env;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_API_BASE: &str = "https://api.mercadolibre.com";
pub const DEFAULT_LISTING_BASE: &str = "https://listado.mercadolibre.com.ar";
/// Upper bound on competitor listings per analysis.
pub const MAX_COMPETITORS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompetitorSourceKind {
    Api,
    Html,
}

impl CompetitorSourceKind {
    pub fn from_raw(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "api" | "json" => Some(Self::Api),
            "html" | "scrape" => Some(Self::Html),
            _ => None,
        }
    }
}

/// What to do when the item lookup does not produce a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingFallback {
    /// Build a placeholder listing from the URL slug.
    Url,
    /// Report the failure to the client.
    Disabled,
}

impl ListingFallback {
    pub fn from_raw(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "url" | "derive" => Some(Self::Url),
            "none" | "off" | "error" => Some(Self::Disabled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub api_base: String,
    pub listing_base: String,
    pub http_timeout: Duration,
    pub connect_timeout: Duration,
    pub competitor_source: CompetitorSourceKind,
    pub competitor_limit: usize,
    pub keyword_top_n: usize,
    pub listing_fallback: ListingFallback,
    pub body_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            api_base: DEFAULT_API_BASE.to_string(),
            listing_base: DEFAULT_LISTING_BASE.to_string(),
            http_timeout: Duration::from_secs(8),
            connect_timeout: Duration::from_secs(5),
            competitor_source: CompetitorSourceKind::Api,
            competitor_limit: MAX_COMPETITORS,
            keyword_top_n: 10,
            listing_fallback: ListingFallback::Url,
            body_limit: 64 * 1024,
        }
    }
}

impl AppConfig {
    /// Reads `.env` (if present) and the process environment on top of the defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();
        Self {
            port: parse_env("PORT").unwrap_or(defaults.port),
            api_base: env_url("MARKETPLACE_API_BASE").unwrap_or(defaults.api_base),
            listing_base: env_url("MARKETPLACE_LISTING_BASE").unwrap_or(defaults.listing_base),
            http_timeout: parse_env::<u64>("HTTP_TIMEOUT_SECS")
                .filter(|v| *v > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            connect_timeout: parse_env::<u64>("HTTP_CONNECT_TIMEOUT_SECS")
                .filter(|v| *v > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            competitor_source: enum_env(
                "COMPETITOR_SOURCE",
                CompetitorSourceKind::from_raw,
                defaults.competitor_source,
            ),
            competitor_limit: parse_env::<usize>("COMPETITOR_LIMIT")
                .filter(|v| competitor_limit_in_range(*v))
                .unwrap_or(defaults.competitor_limit),
            keyword_top_n: parse_env::<usize>("KEYWORD_TOP_N")
                .filter(|v| *v >= 1)
                .unwrap_or(defaults.keyword_top_n),
            listing_fallback: enum_env(
                "LISTING_FALLBACK",
                ListingFallback::from_raw,
                defaults.listing_fallback,
            ),
            body_limit: parse_env::<usize>("REQUEST_MAX_BYTES")
                .filter(|v| *v > 0)
                .unwrap_or(defaults.body_limit),
        }
    }
}

fn competitor_limit_in_range(limit: usize) -> bool {
    (1..=MAX_COMPETITORS).contains(&limit)
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn env_url(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
}

fn enum_env<T: Copy>(key: &str, parse: fn(&str) -> Option<T>, default: T) -> T {
    match env::var(key) {
        Ok(raw) => parse(&raw).unwrap_or_else(|| {
            warn!(target = "seo.config", key, value = %raw, "unrecognized value, using default");
            default
        }),
        Err(_) => default,
    }
}
