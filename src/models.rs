use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default, alias = "publicationUrl")]
    pub url: Option<String>,
}

/// A listing as seen for the duration of one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingSnapshot {
    pub id: String,
    pub title: String,
    pub price: i64,
    pub description: String,
}

impl ListingSnapshot {
    pub const DEFAULT_TITLE: &'static str = "Producto";
    pub const DEFAULT_DESCRIPTION: &'static str = "Sin descripción";

    /// Text the subject keywords come from. Placeholder descriptions add nothing.
    pub fn keyword_text(&self) -> String {
        if self.description == Self::DEFAULT_DESCRIPTION {
            self.title.clone()
        } else {
            format!("{} {}", self.title, self.description)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorListing {
    pub title: String,
    pub price: f64,
    pub sold_quantity: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub word: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    P0,
    P1,
    P2,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordGapEntry {
    pub keyword: String,
    pub importance: usize,
    pub priority: Priority,
    pub suggested_placement: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentData {
    pub title: String,
    pub price: i64,
    pub description: String,
    pub competitor_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuggestedTitle {
    pub intent: &'static str,
    pub title: String,
    pub coverage: u8,
    pub reasoning: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorAnalysis {
    pub top_keywords: Vec<KeywordCount>,
    pub missing_keywords: Vec<KeywordCount>,
    pub average_price: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChecklistItem {
    pub task: String,
    pub priority: Priority,
    pub impact: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub current_data: CurrentData,
    pub suggested_titles: Vec<SuggestedTitle>,
    pub optimized_description: String,
    pub your_keywords: Vec<KeywordCount>,
    pub competitor_analysis: CompetitorAnalysis,
    pub competitors: Vec<CompetitorListing>,
    pub keyword_gap: Vec<KeywordGapEntry>,
    pub checklist: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingSource {
    Api,
    Url,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMeta {
    pub analysis_id: String,
    pub item_id: String,
    pub generated_at: DateTime<Utc>,
    pub listing_source: ListingSource,
    pub stages: Vec<StageReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub report: AnalysisReport,
    pub meta: AnalysisMeta,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageReport {
    pub name: String,
    pub elapsed_ms: u128,
    pub timestamp: DateTime<Utc>,
    pub output: Value,
}

impl StageReport {
    pub fn new(name: &str, elapsed_ms: u128, output: Value) -> Self {
        Self {
            name: name.to_string(),
            elapsed_ms,
            timestamp: Utc::now(),
            output,
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub stage: Option<String>,
}
