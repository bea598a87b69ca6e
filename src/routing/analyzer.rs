//! Query analysis for model routing
//!
//! Classifies a query's complexity, domain, and requirements with zero-cost
//! heuristic rules. Independent of the retrieval-side classifier: routing
//! cares about how hard a query is, not whether it should hit the corpus.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Word count above which a query is considered complex outright
const COMPLEX_WORD_COUNT: usize = 30;

/// Word count above which long-context support is required
const LONG_CONTEXT_WORD_COUNT: usize = 50;

/// Tokens-per-word expansion factor for the input side of the estimate
const TOKENS_PER_WORD: f64 = 1.3;

/// Ordered simple-query rules, checked before anything else
static SIMPLE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)^\s*(hi|hello|hey|thanks|thank\s+you|good\s+(morning|afternoon|evening))\b")
            .expect("greeting regex is valid"),
        Regex::new(r"(?i)^\s*(what|who|when|where)\s+(is|are|was|were)\s+(\w+\s*){1,4}\??\s*$")
            .expect("short factual question regex is valid"),
        Regex::new(r"(?i)^\s*(yes|no|ok|okay|sure)\b[^?]{0,20}$").expect("ack regex is valid"),
    ]
});

/// Ordered complex-query rules, checked after the simple rules miss
static COMPLEX_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\b(analy[sz]e|compare|evaluate|architect|design|implement|optimi[sz]e|refactor|debug)\b")
            .expect("complex verb regex is valid"),
        Regex::new(r"(?i)\b(step[\s-]by[\s-]step|in\s+depth|comprehensive|trade[\s-]?offs?|pros\s+and\s+cons)\b")
            .expect("multi-step vocabulary regex is valid"),
        Regex::new(r"(?i)\b(multi[\s-]step|end[\s-]to[\s-]end|walk\s+me\s+through)\b")
            .expect("walkthrough regex is valid"),
    ]
});

static LONG_CONTEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(document|file|entire|full\s+text|whole|transcript|summari[sz]e\s+this)\b")
        .expect("long context regex is valid")
});
static REASONING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(why|how\s+does|explain|reason|logic|prove|deduce|justify)\b")
        .expect("reasoning regex is valid")
});
static CREATIVITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(creative|story|poem|imagine|brainstorm|fiction)\b")
        .expect("creativity regex is valid")
});
static CODE_GENERATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(write|generate|create|fix)\b.*\b(code|function|script|program|class|module|bug)\b")
        .expect("code generation regex is valid")
});
static DATA_ANALYSIS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(analy[sz]e|data|statistics|calculate|trend|correlat)")
        .expect("data analysis regex is valid")
});

/// Domain vocabularies, scored by substring hits against the lower-cased query
const CODING_KEYWORDS: &[&str] = &[
    "code",
    "function",
    "debug",
    "program",
    "script",
    "api",
    "compile",
    "refactor",
    "typescript",
    "javascript",
    "python",
    "rust",
    "sql",
    "algorithm",
    "implement",
    "library",
    "regex",
    "bug",
];

const CREATIVE_KEYWORDS: &[&str] = &[
    "story",
    "poem",
    "creative",
    "imagine",
    "fiction",
    "brainstorm",
    "slogan",
    "song",
    "narrative",
    "character",
    "blog post",
    "headline",
    "marketing copy",
];

const ANALYTICS_KEYWORDS: &[&str] = &[
    "analyze",
    "analyse",
    "statistics",
    "trend",
    "metric",
    "average",
    "correlation",
    "forecast",
    "chart",
    "dataset",
    "distribution",
    "aggregate",
    "percentage",
    "report",
];

const TECHNICAL_KEYWORDS: &[&str] = &[
    "architecture",
    "infrastructure",
    "deploy",
    "kubernetes",
    "docker",
    "database",
    "network",
    "server",
    "protocol",
    "latency",
    "scaling",
    "configure",
    "linux",
    "cloud",
];

/// Query complexity tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryComplexity {
    Simple,
    Moderate,
    Complex,
}

impl QueryComplexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryComplexity::Simple => "simple",
            QueryComplexity::Moderate => "moderate",
            QueryComplexity::Complex => "complex",
        }
    }
}

impl std::fmt::Display for QueryComplexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query domain. Ties between keyword counts resolve in the fixed priority
/// order coding > analytics > technical > creative; no hits at all means
/// `General`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryDomain {
    General,
    Coding,
    Creative,
    Analytics,
    Technical,
}

impl QueryDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryDomain::General => "general",
            QueryDomain::Coding => "coding",
            QueryDomain::Creative => "creative",
            QueryDomain::Analytics => "analytics",
            QueryDomain::Technical => "technical",
        }
    }
}

impl std::fmt::Display for QueryDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Independent requirement flags; any combination can hold at once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequirements {
    pub needs_long_context: bool,
    pub needs_reasoning: bool,
    pub needs_creativity: bool,
    pub needs_code_generation: bool,
    pub needs_data_analysis: bool,
}

/// Full routing-side view of a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnalysis {
    pub complexity: QueryComplexity,
    pub domain: QueryDomain,
    pub requirements: QueryRequirements,
    pub estimated_tokens: usize,
    pub confidence: f32,
}

/// Analyze a query for routing. Pure and total: any string, including the
/// empty one, yields a well-formed analysis.
pub fn analyze_query(query: &str) -> QueryAnalysis {
    let lower = query.to_lowercase();
    let word_count = query.split_whitespace().count();

    let (complexity, base_confidence) = detect_complexity(query, word_count);
    let domain = detect_domain(&lower);

    let requirements = QueryRequirements {
        needs_long_context: word_count > LONG_CONTEXT_WORD_COUNT || LONG_CONTEXT_RE.is_match(query),
        needs_reasoning: complexity == QueryComplexity::Complex || REASONING_RE.is_match(query),
        needs_creativity: domain == QueryDomain::Creative || CREATIVITY_RE.is_match(query),
        needs_code_generation: domain == QueryDomain::Coding || CODE_GENERATION_RE.is_match(query),
        needs_data_analysis: domain == QueryDomain::Analytics || DATA_ANALYSIS_RE.is_match(query),
    };

    // A recognized domain means the vocabulary gave us a clearer signal
    let confidence = if domain == QueryDomain::General {
        base_confidence
    } else {
        (base_confidence + 0.05).min(0.95)
    };

    QueryAnalysis {
        complexity,
        domain,
        requirements,
        estimated_tokens: estimate_tokens(word_count, complexity),
        confidence,
    }
}

/// Ordered cascade: simple rules, then complex rules, then the word-count
/// threshold, and moderate as the fallthrough
fn detect_complexity(query: &str, word_count: usize) -> (QueryComplexity, f32) {
    if SIMPLE_PATTERNS.iter().any(|re| re.is_match(query)) {
        return (QueryComplexity::Simple, 0.9);
    }
    if COMPLEX_PATTERNS.iter().any(|re| re.is_match(query)) {
        return (QueryComplexity::Complex, 0.85);
    }
    if word_count > COMPLEX_WORD_COUNT {
        return (QueryComplexity::Complex, 0.8);
    }
    (QueryComplexity::Moderate, 0.7)
}

fn detect_domain(lower: &str) -> QueryDomain {
    let hits = |vocab: &[&str]| vocab.iter().filter(|kw| lower.contains(*kw)).count();

    // Fixed priority order; a later domain must strictly beat the running
    // maximum to win a tie
    let scored = [
        (QueryDomain::Coding, hits(CODING_KEYWORDS)),
        (QueryDomain::Analytics, hits(ANALYTICS_KEYWORDS)),
        (QueryDomain::Technical, hits(TECHNICAL_KEYWORDS)),
        (QueryDomain::Creative, hits(CREATIVE_KEYWORDS)),
    ];

    let mut best = QueryDomain::General;
    let mut best_count = 0;
    for (domain, count) in scored {
        if count > best_count {
            best = domain;
            best_count = count;
        }
    }
    best
}

/// Word count scaled to input tokens plus a response allowance by complexity
fn estimate_tokens(word_count: usize, complexity: QueryComplexity) -> usize {
    let input = (word_count as f64 * TOKENS_PER_WORD).ceil() as usize;
    let response = match complexity {
        QueryComplexity::Simple => 300,
        QueryComplexity::Moderate => 800,
        QueryComplexity::Complex => 2000,
    };
    input + response
}
