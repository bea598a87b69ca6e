//! Entity and intent extraction from free-text queries
//!
//! Pure pattern matching with no failure mode: every extractor returns an
//! empty/absent value when nothing matches, never an error. The event-type
//! predicates here are the single source of truth for "is this query
//! purchase-ish" and are reused by the retrieval pipeline's force-add step.

use std::sync::LazyLock;

use chrono::Duration;
use chrono::Local;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::EventType;

static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").expect("iso date regex is valid"));
static TODAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\btoday\b").expect("today regex is valid"));
static YESTERDAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\byesterday\b").expect("yesterday regex is valid"));
static LAST_WEEK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blast\s+week\b").expect("last week regex is valid"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("email regex is valid")
});

static DOLLAR_PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+(?:\.\d+)?)").expect("dollar price regex is valid"));
static WORD_PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*dollars\b").expect("word price regex is valid")
});

static PURCHASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(purchases?|purchased|bought|buy|buying|orders?|ordered|transactions?|paid|payments?|spent|spending)\b")
        .expect("purchase vocabulary regex is valid")
});
static SEARCH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(search(es|ed|ing)?|quer(y|ies|ied)|looked\s+up|looking\s+for)\b")
        .expect("search vocabulary regex is valid")
});
static PAGEVIEW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(pageviews?|page\s+views?|pages?|visits?|visited|visiting|views?|viewed|brows(e|ed|ing)|sessions?)\b")
        .expect("pageview vocabulary regex is valid")
});

/// Brands recognized by substring match, lower-cased canonical form
const KNOWN_BRANDS: &[&str] = &[
    "nike",
    "adidas",
    "puma",
    "reebok",
    "apple",
    "samsung",
    "sony",
    "dell",
    "lenovo",
    "zara",
    "h&m",
    "ikea",
    "lego",
    "dyson",
];

/// Ordered "search for X" extraction patterns; first match per pattern wins
static SEARCH_TERM_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r#"(?i)\bsearch(?:ed|ing)?\s+for\s+"([^"]+)""#).expect("quoted search regex"),
        Regex::new(r"(?i)\bsearch(?:ed|ing)?\s+for\s+([a-z0-9][a-z0-9 '&-]*?)(?:[?.!,;]|$)")
            .expect("unquoted search regex"),
        Regex::new(r#"(?i)\blook(?:ed|ing)?\s+(?:up|for)\s+"([^"]+)""#)
            .expect("quoted lookup regex"),
        Regex::new(r"(?i)\bquer(?:y|ies|ied)\s+(?:about|for)\s+([a-z0-9][a-z0-9 '&-]*?)(?:[?.!,;]|$)")
            .expect("query-for regex"),
    ]
});

/// Intent categories a query can carry. Multiple may apply; a query with no
/// recognizable intent defaults to `Semantic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryIntent {
    Aggregation,
    Ranking,
    Temporal,
    Comparison,
    Specific,
    Semantic,
}

impl QueryIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryIntent::Aggregation => "aggregation",
            QueryIntent::Ranking => "ranking",
            QueryIntent::Temporal => "temporal",
            QueryIntent::Comparison => "comparison",
            QueryIntent::Specific => "specific",
            QueryIntent::Semantic => "semantic",
        }
    }
}

impl std::fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered intent rules, first to last; all matching categories are collected
static INTENT_PATTERNS: LazyLock<Vec<(QueryIntent, Regex)>> = LazyLock::new(|| {
    vec![
        (
            QueryIntent::Aggregation,
            Regex::new(r"(?i)\b(how\s+many|count|total|sum|average|avg|number\s+of)\b")
                .expect("aggregation regex is valid"),
        ),
        (
            QueryIntent::Ranking,
            Regex::new(r"(?i)\b(top|most|highest|lowest|best|worst|largest|smallest)\b")
                .expect("ranking regex is valid"),
        ),
        (
            QueryIntent::Temporal,
            Regex::new(
                r"(?i)\b(today|yesterday|last\s+(week|month|year)|this\s+(week|month|year)|recent(ly)?|latest)\b",
            )
            .expect("temporal regex is valid"),
        ),
        (
            QueryIntent::Comparison,
            Regex::new(r"(?i)\b(compare|versus|vs\.?|difference\s+between|more\s+than|less\s+than)\b")
                .expect("comparison regex is valid"),
        ),
        (
            QueryIntent::Specific,
            Regex::new(
                r"(?i)\b(specific|exact|particular)\b|[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}|\b\d{4}-\d{2}-\d{2}\b",
            )
            .expect("specific regex is valid"),
        ),
    ]
});

/// Ordered requested-count patterns; the first positive integer wins
static TOP_K_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\btop\s+(\d+)").expect("top-n regex is valid"),
        Regex::new(r"(?i)\b(\d+)\s+most\b").expect("n-most regex is valid"),
        Regex::new(r"(?i)\b(\d+)\s+top\b").expect("n-top regex is valid"),
        Regex::new(r"(?i)\bfirst\s+(\d+)").expect("first-n regex is valid"),
        Regex::new(r"(?i)\bshow\s+me\s+(\d+)").expect("show-me-n regex is valid"),
        Regex::new(r"(?i)\bget\s+me\s+(\d+)").expect("get-me-n regex is valid"),
        Regex::new(r"(?i)\bfind\s+(\d+)").expect("find-n regex is valid"),
        Regex::new(r"(?i)\b(\d+)\s+(?:results|records|items)\b").expect("n-results regex is valid"),
    ]
});
static BARE_TOP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\btop\b").expect("bare top regex is valid"));

/// Structured signals pulled out of a raw query string
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryEntities {
    /// ISO dates, both literal and resolved from relative terms
    pub dates: Vec<String>,
    pub emails: Vec<String>,
    pub prices: Vec<String>,
    pub brands: Vec<String>,
    pub event_types: Vec<EventType>,
    pub search_terms: Vec<String>,
}

impl QueryEntities {
    /// Names of the categories that captured at least one value
    pub fn non_empty_categories(&self) -> Vec<String> {
        let mut names = Vec::new();
        if !self.dates.is_empty() {
            names.push("dates".to_string());
        }
        if !self.emails.is_empty() {
            names.push("emails".to_string());
        }
        if !self.prices.is_empty() {
            names.push("prices".to_string());
        }
        if !self.brands.is_empty() {
            names.push("brands".to_string());
        }
        if !self.event_types.is_empty() {
            names.push("event_types".to_string());
        }
        if !self.search_terms.is_empty() {
            names.push("search_terms".to_string());
        }
        names
    }
}

/// Everything the extractor derives from one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedQuery {
    pub entities: QueryEntities,
    pub intents: Vec<QueryIntent>,
    pub top_k: Option<usize>,
}

/// Run the full extractor against today's date
pub fn extract(query: &str) -> ExtractedQuery {
    extract_at(query, Local::now().date_naive())
}

/// Run the full extractor against an explicit reference date
pub fn extract_at(query: &str, today: NaiveDate) -> ExtractedQuery {
    ExtractedQuery {
        entities: extract_entities_at(query, today),
        intents: detect_intents(query),
        top_k: extract_top_k(query),
    }
}

/// Extract structured entities against today's date
pub fn extract_entities(query: &str) -> QueryEntities {
    extract_entities_at(query, Local::now().date_naive())
}

/// Extract structured entities against an explicit reference date.
///
/// Overlapping captures across categories are kept as-is; a literal date can
/// legitimately surface in more than one place.
pub fn extract_entities_at(query: &str, today: NaiveDate) -> QueryEntities {
    let normalized = query.to_lowercase();
    let mut entities = QueryEntities::default();

    for m in ISO_DATE_RE.find_iter(query) {
        entities.dates.push(m.as_str().to_string());
    }
    if TODAY_RE.is_match(query) {
        entities.dates.push(today.format("%Y-%m-%d").to_string());
    }
    if YESTERDAY_RE.is_match(query) {
        entities
            .dates
            .push((today - Duration::days(1)).format("%Y-%m-%d").to_string());
    }
    if LAST_WEEK_RE.is_match(query) {
        // The seven calendar dates ending yesterday, oldest first
        for days_back in (1..=7).rev() {
            entities
                .dates
                .push((today - Duration::days(days_back)).format("%Y-%m-%d").to_string());
        }
    }

    for m in EMAIL_RE.find_iter(query) {
        entities.emails.push(m.as_str().to_string());
    }

    for caps in DOLLAR_PRICE_RE.captures_iter(query) {
        if let Some(m) = caps.get(1) {
            entities.prices.push(m.as_str().to_string());
        }
    }
    for caps in WORD_PRICE_RE.captures_iter(query) {
        if let Some(m) = caps.get(1) {
            entities.prices.push(m.as_str().to_string());
        }
    }

    for brand in KNOWN_BRANDS {
        if normalized.contains(brand) {
            entities.brands.push((*brand).to_string());
        }
    }

    entities.event_types = infer_event_types(query);

    for pattern in SEARCH_TERM_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(query) {
            if let Some(m) = caps.get(1) {
                let term = m.as_str().trim().to_string();
                if !term.is_empty() && !entities.search_terms.contains(&term) {
                    entities.search_terms.push(term);
                }
            }
        }
    }

    entities
}

/// Collect every intent category whose pattern matches; `Semantic` when none do
pub fn detect_intents(query: &str) -> Vec<QueryIntent> {
    let mut intents: Vec<QueryIntent> = INTENT_PATTERNS
        .iter()
        .filter(|(_, pattern)| pattern.is_match(query))
        .map(|(intent, _)| *intent)
        .collect();

    if intents.is_empty() {
        intents.push(QueryIntent::Semantic);
    }
    intents
}

/// Requested result count, if the query phrases one.
///
/// A bare "top" with no digit asks for the conventional five; a query with
/// neither leaves the count to the caller.
pub fn extract_top_k(query: &str) -> Option<usize> {
    for pattern in TOP_K_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(query) {
            if let Some(m) = caps.get(1) {
                if let Ok(k) = m.as_str().parse::<usize>() {
                    if k > 0 {
                        return Some(k);
                    }
                }
            }
        }
    }
    if BARE_TOP_RE.is_match(query) {
        return Some(5);
    }
    None
}

/// True when the query uses purchase vocabulary
pub fn mentions_purchase(query: &str) -> bool {
    PURCHASE_RE.is_match(query)
}

/// True when the query uses search vocabulary
pub fn mentions_search(query: &str) -> bool {
    SEARCH_RE.is_match(query)
}

/// True when the query uses pageview vocabulary
pub fn mentions_pageview(query: &str) -> bool {
    PAGEVIEW_RE.is_match(query)
}

/// Event types a query plausibly targets; zero, one, or several
pub fn infer_event_types(query: &str) -> Vec<EventType> {
    let mut types = Vec::new();
    if mentions_purchase(query) {
        types.push(EventType::Purchase);
    }
    if mentions_search(query) {
        types.push(EventType::Search);
    }
    if mentions_pageview(query) {
        types.push(EventType::Pageview);
    }
    types
}
