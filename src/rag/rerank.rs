//! Heuristic re-ranking of similarity candidates
//!
//! Cheap lexical signals correct for what embedding similarity cannot see:
//! numeric price intent and exact search-term matches. Adjustments are
//! additive on the raw similarity score; ordering and truncation happen on
//! the unclamped values, the returned scores are clamped to [0, 1].

use std::sync::LazyLock;

use regex::Regex;

use crate::models::SearchMatch;

static EXPENSIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(expensive|priciest|highest\s+price[ds]?)\b")
        .expect("expensive regex is valid")
});
static CHEAP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(cheap(est)?|lowest\s+price[ds]?)\b").expect("cheap regex is valid")
});

/// Weight of the price adjustment per thousand currency units
const PRICE_WEIGHT: f64 = 0.3;

/// Flat bonus when a row's search term appears verbatim in the query
const TERM_MATCH_BONUS: f32 = 0.2;

/// Re-rank candidates for one query: adjust, sort descending, truncate to
/// `top_k`, then clamp the surviving scores.
pub fn rerank(query: &str, mut candidates: Vec<SearchMatch>, top_k: usize) -> Vec<SearchMatch> {
    let wants_expensive = EXPENSIVE_RE.is_match(query);
    let wants_cheap = CHEAP_RE.is_match(query);
    let normalized = query.to_lowercase();

    for candidate in &mut candidates {
        if let Some(price) = candidate.metadata.price() {
            let adjustment = ((price / 1000.0) * PRICE_WEIGHT) as f32;
            if wants_expensive {
                candidate.score += adjustment;
            }
            if wants_cheap {
                candidate.score -= adjustment;
            }
        }

        if let Some(term) = candidate.metadata.search_term() {
            if !term.is_empty() && normalized.contains(&term.to_lowercase()) {
                candidate.score += TERM_MATCH_BONUS;
            }
        }
    }

    // Stable sort keeps store order for exact ties, so repeated queries
    // return identical orderings
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(top_k);

    for candidate in &mut candidates {
        candidate.score = candidate.score.clamp(0.0, 1.0);
    }

    candidates
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;
    use crate::models::EventType;
    use crate::models::PurchaseMetadata;
    use crate::models::RecordMetadata;
    use crate::models::SearchMetadata;

    fn purchase_match(score: f32, price: f64) -> SearchMatch {
        SearchMatch {
            id: Uuid::new_v4(),
            score,
            event_type: EventType::Purchase,
            event_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            email: "buyer@example.com".to_string(),
            metadata: RecordMetadata::Purchase(PurchaseMetadata {
                price: Some(price),
                ..Default::default()
            }),
        }
    }

    fn search_match(score: f32, term: &str) -> SearchMatch {
        SearchMatch {
            id: Uuid::new_v4(),
            score,
            event_type: EventType::Search,
            event_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            email: "seeker@example.com".to_string(),
            metadata: RecordMetadata::Search(SearchMetadata {
                search_term: Some(term.to_string()),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_expensive_intent_boosts_priced_rows() {
        let candidates = vec![
            purchase_match(0.80, 100.0),
            purchase_match(0.78, 900.0),
            purchase_match(0.82, 50.0),
        ];

        let ranked = rerank("show me the most expensive purchases", candidates, 3);

        // 0.78 + 0.27 = 1.05 (clamped to 1.0) beats 0.82 + 0.015 and 0.80 + 0.03
        assert_eq!(ranked[0].metadata.price(), Some(900.0));
        assert_eq!(ranked[0].score, 1.0);
        assert_eq!(ranked[1].metadata.price(), Some(50.0));
        assert_eq!(ranked[2].metadata.price(), Some(100.0));
    }

    #[test]
    fn test_cheap_intent_penalizes_priced_rows() {
        let candidates = vec![purchase_match(0.9, 2000.0), purchase_match(0.6, 10.0)];

        let ranked = rerank("cheapest orders", candidates, 2);

        // 0.9 - 0.6 = 0.3 drops below 0.6 - 0.003
        assert_eq!(ranked[0].metadata.price(), Some(10.0));
        assert_eq!(ranked[1].metadata.price(), Some(2000.0));
    }

    #[test]
    fn test_scores_clamped_after_ordering() {
        let candidates = vec![
            purchase_match(0.5, 1_000_000.0),
            purchase_match(0.99, 0.0),
        ];

        let ranked = rerank("highest price orders", candidates, 2);

        // The extreme price wins the ordering on its unclamped score but
        // surfaces as exactly 1.0
        assert_eq!(ranked[0].metadata.price(), Some(1_000_000.0));
        assert!(ranked.iter().all(|m| (0.0..=1.0).contains(&m.score)));

        let ranked = rerank("cheapest orders", vec![purchase_match(0.5, 1_000_000.0)], 1);
        assert_eq!(ranked[0].score, 0.0);
    }

    #[test]
    fn test_verbatim_search_term_gets_flat_bonus() {
        let candidates = vec![
            search_match(0.70, "Wireless Earbuds"),
            search_match(0.75, "garden hose"),
        ];

        let ranked = rerank("who searched for wireless earbuds", candidates, 2);

        assert_eq!(ranked[0].metadata.search_term(), Some("Wireless Earbuds"));
        assert!((ranked[0].score - 0.90).abs() < 1e-6);
        assert!((ranked[1].score - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_rows_without_price_are_untouched_by_price_intent() {
        let candidates = vec![search_match(0.8, "lamp"), purchase_match(0.7, 500.0)];

        let ranked = rerank("most expensive items", candidates, 2);

        // 0.7 + 0.15 = 0.85 overtakes the unpriced 0.8
        assert_eq!(ranked[0].metadata.price(), Some(500.0));
        assert!((ranked[1].score - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_truncates_to_top_k() {
        let candidates = (0..6).map(|i| purchase_match(0.5 + i as f32 * 0.05, 10.0)).collect();
        let ranked = rerank("purchases", candidates, 3);
        assert_eq!(ranked.len(), 3);
        assert!((ranked[0].score - 0.75).abs() < 1e-6);
    }
}
