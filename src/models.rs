use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Event categories tracked in the corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Purchase,
    Pageview,
    Search,
    Unknown,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Purchase => "purchase",
            EventType::Pageview => "pageview",
            EventType::Search => "search",
            EventType::Unknown => "unknown",
        }
    }
}

impl From<&str> for EventType {
    fn from(value: &str) -> Self {
        match value {
            "purchase" => EventType::Purchase,
            "pageview" => EventType::Pageview,
            "search" => EventType::Search,
            _ => EventType::Unknown,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Purchase event payload stored in the metadata JSONB column
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseMetadata {
    pub price: Option<f64>,
    pub quantity: Option<u32>,
    #[serde(default)]
    pub brands: Vec<String>,
    pub category: Option<String>,
    pub order_id: Option<String>,
}

/// Pageview event payload stored in the metadata JSONB column
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageviewMetadata {
    pub url: Option<String>,
    pub title: Option<String>,
    pub referrer: Option<String>,
    pub duration_seconds: Option<u32>,
}

/// Search event payload stored in the metadata JSONB column
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchMetadata {
    pub search_term: Option<String>,
    pub results_count: Option<u32>,
    pub clicked: Option<bool>,
}

/// Typed view of the metadata JSONB column, dispatched on the stored
/// `eventType` tag. Rows with an unrecognized tag still deserialize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "eventType", rename_all = "lowercase")]
pub enum RecordMetadata {
    Purchase(PurchaseMetadata),
    Pageview(PageviewMetadata),
    Search(SearchMetadata),
    #[serde(other)]
    Unknown,
}

impl RecordMetadata {
    /// Price of a purchase row, if present
    pub fn price(&self) -> Option<f64> {
        match self {
            RecordMetadata::Purchase(p) => p.price,
            _ => None,
        }
    }

    /// Search term of a search row, if present
    pub fn search_term(&self) -> Option<&str> {
        match self {
            RecordMetadata::Search(s) => s.search_term.as_deref(),
            _ => None,
        }
    }

    /// Parse the metadata JSONB value, falling back to `Unknown` when the
    /// stored shape predates the current tag scheme
    pub fn from_value(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or(RecordMetadata::Unknown)
    }
}

/// A single retrieved event, scored and privacy-scrubbed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMatch {
    pub id: Uuid,
    /// Final relevance score, clamped to [0, 1] after re-ranking
    pub score: f32,
    pub event_type: EventType,
    pub event_date: NaiveDate,
    /// Scrambled before leaving the pipeline
    pub email: String,
    pub metadata: RecordMetadata,
}

/// Result envelope returned by the hybrid search pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub matches: Vec<SearchMatch>,
    pub method: String,
    /// Names of the entity categories that constrained the store query
    pub filters: Vec<String>,
    pub requested_top_k: usize,
}

impl SearchResult {
    pub fn new(matches: Vec<SearchMatch>, filters: Vec<String>, requested_top_k: usize) -> Self {
        Self {
            matches,
            method: "hybrid-search".to_string(),
            filters,
            requested_top_k,
        }
    }
}

/// Aggregate counts over the event corpus
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventStats {
    pub total_events: i64,
    pub purchases: i64,
    pub pageviews: i64,
    pub searches: i64,
    pub distinct_emails: i64,
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
}

/// Maximum query length persisted to the query log
pub const MAX_LOGGED_QUERY_CHARS: usize = 500;

/// Best-effort analytics record written after each search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryLogEntry {
    pub query: String,
    pub result_count: i32,
    pub latency_ms: i64,
    pub method: String,
}

impl QueryLogEntry {
    pub fn new(query: &str, result_count: usize, latency_ms: i64, method: &str) -> Self {
        Self {
            query: query.chars().take(MAX_LOGGED_QUERY_CHARS).collect(),
            result_count: result_count as i32,
            latency_ms,
            method: method.to_string(),
        }
    }
}

/// Stored query-log row, read back by the stats command
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QueryLogRecord {
    pub id: Uuid,
    pub query: String,
    pub result_count: i32,
    pub latency_ms: i64,
    pub method: String,
    pub created_at: DateTime<Utc>,
}
