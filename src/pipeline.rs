use crate::analysis::{self, gap, identifier};
use crate::config::{AppConfig, ListingFallback};
use crate::marketplace::{CompetitorSource, FetchOutcome, ItemsClient};
use crate::models::{
    AnalysisMeta, AnalyzeRequest, AnalyzeResponse, CompetitorListing, KeywordCount,
    KeywordGapEntry, ListingSnapshot, ListingSource, StageReport,
};
use chrono::Utc;
use reqwest::Client;
use serde_json::{Value, json};
use std::{future::Future, sync::Arc, time::Instant};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

pub const MISSING_URL: &str = "URL requerida";
pub const INVALID_ID: &str = "ID invalido";
pub const LISTING_NOT_FOUND: &str = "Publicación no encontrada";

/// Words of the listing title used as the competitor search phrase.
const SEARCH_WORDS: usize = 3;

#[derive(Clone)]
pub struct Pipeline {
    pub config: Arc<PipelineConfig>,
    items: ItemsClient,
    competitors: CompetitorSource,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub keyword_top_n: usize,
    pub competitor_limit: usize,
    pub listing_fallback: ListingFallback,
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            keyword_top_n: config.keyword_top_n,
            competitor_limit: config.competitor_limit,
            listing_fallback: config.listing_fallback,
        }
    }
}

impl Pipeline {
    pub fn new(config: &AppConfig, http: Client) -> Self {
        Self {
            config: Arc::new(PipelineConfig::from(config)),
            items: ItemsClient::new(http.clone(), &config.api_base),
            competitors: CompetitorSource::from_config(config, http),
        }
    }

    pub async fn run(&self, request: AnalyzeRequest) -> Result<AnalyzeResponse, PipelineError> {
        let url = request
            .url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| PipelineError::invalid_input("validate_input", MISSING_URL))?;
        let mut stages = Vec::new();

        let item_id = self
            .capture_stage("extract_id", &mut stages, async {
                stages::extract_id(&url)
            })
            .await?;

        let (snapshot, listing_source) = self
            .capture_stage(
                "fetch_listing",
                &mut stages,
                stages::fetch_listing(&self.items, &url, &item_id, self.config.listing_fallback),
            )
            .await?;

        let competitors = self
            .capture_stage(
                "fetch_competitors",
                &mut stages,
                stages::fetch_competitors(
                    &self.competitors,
                    &snapshot,
                    &item_id,
                    self.config.competitor_limit,
                ),
            )
            .await?;

        let keywords = self
            .capture_stage("analyze_keywords", &mut stages, async {
                stages::analyze_keywords(&snapshot, &competitors, self.config.keyword_top_n)
            })
            .await?;

        let keyword_gap = self
            .capture_stage("keyword_gap", &mut stages, async {
                stages::keyword_gap(&keywords)
            })
            .await?;

        let shown = keywords.competitors.len().min(self.config.keyword_top_n);
        let report = analysis::assemble_report(
            &snapshot,
            &competitors,
            &keywords.subject,
            &keywords.competitors[..shown],
            &keyword_gap,
        );

        info!(
            target = "seo.pipeline",
            item_id = %item_id,
            competitors = competitors.len(),
            gap = keyword_gap.len(),
            "analysis_completed"
        );

        Ok(AnalyzeResponse {
            report,
            meta: AnalysisMeta {
                analysis_id: Uuid::new_v4().to_string(),
                item_id,
                generated_at: Utc::now(),
                listing_source,
                stages,
            },
        })
    }

    async fn capture_stage<T, Fut>(
        &self,
        name: &'static str,
        stages: &mut Vec<StageReport>,
        fut: Fut,
    ) -> Result<T, PipelineError>
    where
        Fut: Future<Output = Result<StageOutcome<T>, PipelineError>>,
    {
        let started = Instant::now();
        let outcome = fut.await?;
        let elapsed_ms = started.elapsed().as_millis();
        crate::metrics::stage_elapsed(name, elapsed_ms);
        stages.push(StageReport::new(name, elapsed_ms, outcome.output));
        Ok(outcome.value)
    }
}

#[derive(Debug, Error)]
#[error("stage `{stage}` failed: {message}")]
pub struct PipelineError {
    stage: &'static str,
    message: String,
    kind: PipelineErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineErrorKind {
    InvalidInput,
    Internal,
}

impl PipelineError {
    pub fn invalid_input(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            kind: PipelineErrorKind::InvalidInput,
        }
    }

    pub fn internal(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            kind: PipelineErrorKind::Internal,
        }
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }

    pub fn kind(&self) -> PipelineErrorKind {
        self.kind
    }

    pub fn detail(&self) -> &str {
        &self.message
    }
}

#[derive(Debug)]
pub struct StageOutcome<T> {
    pub value: T,
    pub output: Value,
}

impl<T> StageOutcome<T> {
    fn new(value: T, output: Value) -> Self {
        Self { value, output }
    }
}

/// Keyword tables for one analysis. `competitors` is the extended list used by the gap.
#[derive(Debug, Clone)]
pub struct KeywordSets {
    pub subject: Vec<KeywordCount>,
    pub competitors: Vec<KeywordCount>,
}

pub mod stages {
    use super::*;

    pub fn extract_id(url: &str) -> Result<StageOutcome<String>, PipelineError> {
        let item_id = identifier::extract_item_id(url)
            .ok_or_else(|| PipelineError::invalid_input("extract_id", INVALID_ID))?;
        let site = identifier::site_of(&item_id).to_string();
        Ok(StageOutcome::new(
            item_id.clone(),
            json!({
                "item_id": item_id,
                "site": site,
            }),
        ))
    }

    pub async fn fetch_listing(
        items: &ItemsClient,
        url: &str,
        item_id: &str,
        fallback: ListingFallback,
    ) -> Result<StageOutcome<(ListingSnapshot, ListingSource)>, PipelineError> {
        let outcome = items.fetch_listing(item_id).await;
        let label = outcome.label();
        crate::metrics::fetch_outcome("items", label);

        let (snapshot, source) = match (outcome, fallback) {
            (FetchOutcome::Found(snapshot), _) => (snapshot, ListingSource::Api),
            (FetchOutcome::NotFound, ListingFallback::Disabled) => {
                return Err(PipelineError::invalid_input(
                    "fetch_listing",
                    LISTING_NOT_FOUND,
                ));
            }
            (FetchOutcome::Error(reason), ListingFallback::Disabled) => {
                return Err(PipelineError::internal("fetch_listing", reason));
            }
            (other, ListingFallback::Url) => {
                if let FetchOutcome::Error(reason) = &other {
                    warn!(target = "seo.pipeline", item_id, error = %reason, "listing_fetch_failed_using_url");
                } else {
                    warn!(target = "seo.pipeline", item_id, "listing_not_found_using_url");
                }
                (placeholder_listing(url, item_id), ListingSource::Url)
            }
        };

        Ok(StageOutcome::new(
            (snapshot.clone(), source),
            json!({
                "title": snapshot.title,
                "price": snapshot.price,
                "source": source,
                "outcome": label,
            }),
        ))
    }

    pub async fn fetch_competitors(
        source: &CompetitorSource,
        snapshot: &ListingSnapshot,
        item_id: &str,
        limit: usize,
    ) -> Result<StageOutcome<Vec<CompetitorListing>>, PipelineError> {
        let phrase = analysis::search_phrase(&snapshot.title, SEARCH_WORDS);
        let site = identifier::site_of(item_id);
        let competitors = source.fetch(&phrase, site, limit).await;
        Ok(StageOutcome::new(
            competitors.clone(),
            json!({
                "phrase": phrase,
                "count": competitors.len(),
            }),
        ))
    }

    pub fn analyze_keywords(
        snapshot: &ListingSnapshot,
        competitors: &[CompetitorListing],
        top_n: usize,
    ) -> Result<StageOutcome<KeywordSets>, PipelineError> {
        let subject_text = snapshot.keyword_text();
        let competitor_text = competitors
            .iter()
            .map(|c| c.title.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let sets = KeywordSets {
            subject: analysis::analyze_keywords(&subject_text, top_n),
            competitors: analysis::analyze_keywords(
                &competitor_text,
                top_n.max(gap::EXTENDED_TOP_N),
            ),
        };
        Ok(StageOutcome::new(
            sets.clone(),
            json!({
                "subject": sets.subject.len(),
                "competitors": sets.competitors.len(),
                "top_competitor_keyword": sets.competitors.first().map(|k| &k.word),
            }),
        ))
    }

    pub fn keyword_gap(
        sets: &KeywordSets,
    ) -> Result<StageOutcome<Vec<KeywordGapEntry>>, PipelineError> {
        let entries = gap::keyword_gap(&sets.subject, &sets.competitors, gap::GAP_CAP);
        Ok(StageOutcome::new(
            entries.clone(),
            json!({
                "count": entries.len(),
                "keywords": entries.iter().map(|e| &e.keyword).collect::<Vec<_>>(),
            }),
        ))
    }

    fn placeholder_listing(url: &str, item_id: &str) -> ListingSnapshot {
        ListingSnapshot {
            id: item_id.to_string(),
            title: identifier::title_from_url(url, item_id)
                .unwrap_or_else(|| ListingSnapshot::DEFAULT_TITLE.into()),
            price: 0,
            description: ListingSnapshot::DEFAULT_DESCRIPTION.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompetitorSourceKind;
    use crate::models::Priority;
    use std::time::Duration;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const URL: &str = "https://articulo.mercadolibre.com.ar/MLA-123456789-lente-camara-celular-_JM";

    fn test_config(server: &MockServer) -> AppConfig {
        AppConfig {
            api_base: server.uri(),
            listing_base: server.uri(),
            http_timeout: Duration::from_millis(500),
            ..AppConfig::default()
        }
    }

    fn pipeline_for(config: &AppConfig) -> Pipeline {
        let http = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .expect("client");
        Pipeline::new(config, http)
    }

    async fn mount_item(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/items/MLA123456789"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "title": "Lente Camara Celular Universal",
                "price": 35090,
                "description": "Lente para camara de celular"
            })))
            .mount(server)
            .await;
    }

    async fn mount_search(server: &MockServer, count: usize) {
        let titles = [
            "Lente Macro Celular Zoom",
            "Kit Lente Macro Zoom Clip",
            "Lente Teleobjetivo Zoom Macro",
        ];
        let results: Vec<_> = (0..count)
            .map(|i| json!({"title": titles[i % titles.len()], "price": 1000 * (i + 1), "sold_quantity": i}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/sites/MLA/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": results})))
            .mount(server)
            .await;
    }

    fn request(url: &str) -> AnalyzeRequest {
        AnalyzeRequest {
            url: Some(url.to_string()),
        }
    }

    #[tokio::test]
    async fn full_run_produces_report_and_stage_sequence() {
        let server = MockServer::start().await;
        mount_item(&server).await;
        mount_search(&server, 6).await;
        let pipeline = pipeline_for(&test_config(&server));

        let resp = pipeline.run(request(URL)).await.expect("pipeline run");
        let names: Vec<&str> = resp.meta.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "extract_id",
                "fetch_listing",
                "fetch_competitors",
                "analyze_keywords",
                "keyword_gap",
            ]
        );
        assert_eq!(resp.meta.item_id, "MLA123456789");
        assert_eq!(resp.meta.listing_source, ListingSource::Api);
        assert_eq!(resp.report.current_data.price, 35090);
        assert_eq!(resp.report.current_data.competitor_count, 6);

        let gap: Vec<&str> = resp
            .report
            .keyword_gap
            .iter()
            .map(|g| g.keyword.as_str())
            .collect();
        assert_eq!(gap[..2], ["macro", "zoom"]);
        assert_eq!(resp.report.keyword_gap[0].priority, Priority::P0);
        assert!(
            resp.report
                .keyword_gap
                .iter()
                .all(|g| resp.report.your_keywords.iter().all(|k| k.word != g.keyword))
        );
    }

    #[tokio::test]
    async fn competitor_list_is_capped() {
        let server = MockServer::start().await;
        mount_item(&server).await;
        mount_search(&server, 45).await;
        let pipeline = pipeline_for(&test_config(&server));
        let resp = pipeline.run(request(URL)).await.expect("pipeline run");
        assert_eq!(resp.report.competitors.len(), 20);
        assert!(resp.report.competitor_analysis.top_keywords.len() <= 10);
    }

    #[tokio::test]
    async fn missing_url_is_invalid_input() {
        let server = MockServer::start().await;
        let pipeline = pipeline_for(&test_config(&server));
        for req in [AnalyzeRequest { url: None }, request("   ")] {
            let err = pipeline.run(req).await.expect_err("should reject");
            assert_eq!(err.kind(), PipelineErrorKind::InvalidInput);
            assert_eq!(err.detail(), MISSING_URL);
        }
    }

    #[tokio::test]
    async fn url_without_identifier_is_invalid_input() {
        let server = MockServer::start().await;
        let pipeline = pipeline_for(&test_config(&server));
        let err = pipeline
            .run(request("https://example.com/some/product"))
            .await
            .expect_err("should reject");
        assert_eq!(err.kind(), PipelineErrorKind::InvalidInput);
        assert_eq!(err.stage(), "extract_id");
        assert_eq!(err.detail(), INVALID_ID);
    }

    #[tokio::test]
    async fn listing_failure_falls_back_to_url_title() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex("^/items/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sites/MLA/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let pipeline = pipeline_for(&test_config(&server));

        let resp = pipeline.run(request(URL)).await.expect("degraded run");
        assert_eq!(resp.meta.listing_source, ListingSource::Url);
        assert_eq!(resp.report.current_data.title, "Lente Camara Celular");
        assert_eq!(resp.report.current_data.description, "Sin descripción");
        assert!(resp.report.competitors.is_empty());
        assert!(resp.report.keyword_gap.is_empty());
    }

    #[tokio::test]
    async fn placeholder_description_adds_no_keywords() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items/MLA123456789"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "title": "Lente Camara Celular",
                "price": 100
            })))
            .mount(&server)
            .await;
        mount_search(&server, 3).await;
        let pipeline = pipeline_for(&test_config(&server));

        let resp = pipeline.run(request(URL)).await.expect("pipeline run");
        let words: Vec<&str> = resp
            .report
            .your_keywords
            .iter()
            .map(|k| k.word.as_str())
            .collect();
        assert_eq!(words, ["lente", "camara", "celular"]);
        assert_eq!(resp.report.current_data.description, "Sin descripción");
    }

    #[tokio::test]
    async fn listing_failure_is_terminal_without_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items/MLA404"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/items/MLA500"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;
        let config = AppConfig {
            listing_fallback: ListingFallback::Disabled,
            ..test_config(&server)
        };
        let pipeline = pipeline_for(&config);

        let err = pipeline.run(request("MLA404")).await.expect_err("not found");
        assert_eq!(err.kind(), PipelineErrorKind::InvalidInput);
        assert_eq!(err.detail(), LISTING_NOT_FOUND);

        let err = pipeline.run(request("MLA500")).await.expect_err("upstream");
        assert_eq!(err.kind(), PipelineErrorKind::Internal);
        assert_eq!(err.stage(), "fetch_listing");
    }

    #[tokio::test]
    async fn html_source_never_leaves_competitors_empty() {
        let server = MockServer::start().await;
        mount_item(&server).await;
        Mock::given(method("GET"))
            .and(path("/lente-camara-celular"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let config = AppConfig {
            competitor_source: CompetitorSourceKind::Html,
            ..test_config(&server)
        };
        let pipeline = pipeline_for(&config);
        let resp = pipeline.run(request(URL)).await.expect("pipeline run");
        assert!(!resp.report.competitors.is_empty());
        assert!(resp.report.competitors.len() <= 20);
    }
}
