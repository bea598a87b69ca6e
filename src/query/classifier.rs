//! Retrieval-vs-conversation query classification
//!
//! A first-match-wins cascade: strong retrieval patterns, then strong
//! conversational patterns, then a keyword-ratio fallback. Deterministic and
//! pure; the same query always yields the same classification.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Ordered strong retrieval patterns; the first match decides at 0.9
static STRONG_RAG_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\bshow\s+(me\s+)?(all\s+)?").expect("show pattern is valid"),
        Regex::new(r"(?i)\btop\s+\d+\b").expect("top-n pattern is valid"),
        Regex::new(r"(?i)\blast\s+(week|month|year|\d+\s+days)\b").expect("last-period pattern"),
        Regex::new(r"(?i)\bpurchases?\s+(from|by|of)\b").expect("purchases-from pattern"),
        Regex::new(r"(?i)\bhow\s+many\b").expect("how-many pattern is valid"),
        Regex::new(r"(?i)\b(list|find)\s+(all|my|the)\b").expect("list-all pattern is valid"),
        Regex::new(r"(?i)\bsearched\s+for\b").expect("searched-for pattern is valid"),
        Regex::new(r"(?i)\bmost\s+(expensive|recent|popular|viewed)\b")
            .expect("most-x pattern is valid"),
    ]
});

/// Ordered strong conversational patterns, checked after the retrieval set
static STRONG_GENERAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)^\s*(hi|hello|hey|good\s+(morning|afternoon|evening))\b")
            .expect("greeting pattern is valid"),
        Regex::new(r"(?i)\bhow\s+are\s+you\b").expect("how-are-you pattern is valid"),
        Regex::new(r"(?i)\bwhat\s+is\s+an?\s+").expect("what-is-a pattern is valid"),
        Regex::new(r"(?i)\bexplain\s+(to\s+me\s+)?").expect("explain pattern is valid"),
        Regex::new(r"(?i)\bwho\s+is\b").expect("who-is pattern is valid"),
        Regex::new(r"(?i)\b(thank\s+you|thanks)\b").expect("thanks pattern is valid"),
        Regex::new(r"(?i)\b(write|generate|create)\s+(a|an|some)\b")
            .expect("write-a pattern is valid"),
        Regex::new(r"(?i)\btell\s+me\s+a\b").expect("tell-me-a pattern is valid"),
    ]
});

/// Data/analytics vocabulary counted by substring hit
const RAG_KEYWORDS: &[&str] = &[
    "purchase",
    "purchases",
    "bought",
    "order",
    "transaction",
    "spent",
    "price",
    "pageview",
    "visited",
    "searched",
    "search",
    "event",
    "records",
    "customer",
    "email",
    "brand",
    "total",
    "count",
    "average",
    "top",
    "most",
    "recent",
    "yesterday",
    "last week",
    "history",
    "data",
    "show",
    "list",
    "filter",
];

/// General-assistance vocabulary counted by substring hit
const GENERAL_KEYWORDS: &[&str] = &[
    "hello",
    "how are you",
    "what is",
    "what are",
    "explain",
    "why",
    "who is",
    "help",
    "can you",
    "could you",
    "please",
    "write",
    "generate",
    "create",
    "tell me",
    "thank",
    "joke",
    "story",
    "advice",
    "recommend",
    "opinion",
    "define",
    "meaning",
    "weather",
];

/// Whether a query asks for corpus retrieval or open conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    Rag,
    General,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Rag => "rag",
            QueryKind::General => "general",
        }
    }
}

impl std::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification outcome with a human-readable reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryClassification {
    #[serde(rename = "type")]
    pub kind: QueryKind,
    pub confidence: f32,
    pub reason: String,
}

/// Classify a query as retrieval or conversation
pub fn classify(query: &str) -> QueryClassification {
    for pattern in STRONG_RAG_PATTERNS.iter() {
        if pattern.is_match(query) {
            return QueryClassification {
                kind: QueryKind::Rag,
                confidence: 0.9,
                reason: format!("strong retrieval pattern matched: {}", pattern.as_str()),
            };
        }
    }

    for pattern in STRONG_GENERAL_PATTERNS.iter() {
        if pattern.is_match(query) {
            return QueryClassification {
                kind: QueryKind::General,
                confidence: 0.9,
                reason: format!("strong conversational pattern matched: {}", pattern.as_str()),
            };
        }
    }

    let normalized = query.to_lowercase();
    let rag_score = RAG_KEYWORDS
        .iter()
        .filter(|k| normalized.contains(*k))
        .count();
    let general_score = GENERAL_KEYWORDS
        .iter()
        .filter(|k| normalized.contains(*k))
        .count();

    if rag_score == 0 && general_score == 0 {
        return QueryClassification {
            kind: QueryKind::General,
            confidence: 0.5,
            reason: "no retrieval or conversational vocabulary; defaulting to conversation"
                .to_string(),
        };
    }

    let rag_ratio = rag_score as f32 / (rag_score + general_score) as f32;
    if rag_ratio > 0.6 {
        QueryClassification {
            kind: QueryKind::Rag,
            confidence: (0.5 + rag_ratio * 0.4).min(0.95),
            reason: format!("data vocabulary dominates ({rag_score} vs {general_score})"),
        }
    } else if rag_ratio < 0.4 {
        QueryClassification {
            kind: QueryKind::General,
            confidence: (0.5 + (1.0 - rag_ratio) * 0.4).min(0.95),
            reason: format!("conversational vocabulary dominates ({general_score} vs {rag_score})"),
        }
    } else {
        // Mixed-signal band keeps its retrieval lean whenever any data
        // vocabulary is present; pinned by a regression test
        let kind = if rag_score > 0 {
            QueryKind::Rag
        } else {
            QueryKind::General
        };
        QueryClassification {
            kind,
            confidence: 0.6,
            reason: format!("mixed signals ({rag_score} vs {general_score}), leaning {kind}"),
        }
    }
}

/// Gate retrieval on corpus availability: an empty store never runs a search,
/// whatever the classifier says
pub fn should_use_rag(query: &str, has_data_loaded: bool) -> bool {
    if !has_data_loaded {
        return false;
    }
    classify(query).kind == QueryKind::Rag
}
