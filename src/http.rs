use crate::config::AppConfig;
use reqwest::Client;

const USER_AGENT: &str = concat!("listing-seo-api/", env!("CARGO_PKG_VERSION"));

pub fn build_client(config: &AppConfig) -> Client {
    Client::builder()
        .timeout(config.http_timeout)
        .connect_timeout(config.connect_timeout)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|_| Client::new())
}
