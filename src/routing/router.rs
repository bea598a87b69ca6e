//! Weighted multi-criteria model selection
//!
//! Deterministic scorer over the static capability matrix. Reproducibility
//! depends on the exact weights, the additive-then-multiplicative modifier
//! order, and the stable descending sort; change any of them and previously
//! logged decisions stop being replayable.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;
use tracing::info;

use crate::routing::analyzer::analyze_query;
use crate::routing::analyzer::QueryAnalysis;
use crate::routing::analyzer::QueryComplexity;
use crate::routing::analyzer::QueryDomain;
use crate::routing::catalog::ModelCapability;
use crate::routing::catalog::ModelCatalog;

const SPEED_WEIGHT: f64 = 20.0;
const REASONING_WEIGHT: f64 = 25.0;
const CODING_WEIGHT: f64 = 20.0;
const CREATIVE_WEIGHT: f64 = 15.0;
const ANALYTICS_WEIGHT: f64 = 15.0;

const COST_BONUS_MAX: f64 = 20.0;
const SPEED_BONUS_WEIGHT: f64 = 25.0;
const QUALITY_BONUS_WEIGHT: f64 = 30.0;

const OVER_BUDGET_PENALTY: f64 = 0.3;
const SHORT_CONTEXT_PENALTY: f64 = 0.7;
const SLOW_MODEL_PENALTY: f64 = 0.5;

/// Context window below which long-context queries are penalized
const MIN_LONG_CONTEXT_WINDOW: usize = 32_000;
/// Context window above which the reasoning string calls out headroom
const LARGE_CONTEXT_WINDOW: usize = 100_000;

/// Floor applied to a priority axis when its requirement flag is set
const REQUIREMENT_FLOOR: f64 = 0.85;

const RECOMMENDATION_COUNT: usize = 5;

/// Capability and priority thresholds for qualitative reasoning call-outs
const CALLOUT_CAPABILITY: f64 = 0.9;
const CALLOUT_PRIORITY: f64 = 0.8;

/// Operator preferences influencing selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingPreferences {
    pub prioritize_cost: bool,
    pub prioritize_speed: bool,
    pub prioritize_quality: bool,
    pub max_cost_per_1m: Option<f64>,
    pub min_speed: Option<f64>,
}

/// One scored catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecommendation {
    pub model: String,
    pub provider: String,
    pub display_name: String,
    pub score: f64,
    pub estimated_cost: f64,
}

/// Final routing decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub selected_model: String,
    pub selected_provider: String,
    pub display_name: String,
    pub analysis: QueryAnalysis,
    pub recommendations: Vec<ModelRecommendation>,
    pub reasoning: String,
    pub confidence: f32,
}

/// Per-axis priority weights derived from the analysis, all in `[0,1]`
#[derive(Debug, Clone, Copy)]
struct PriorityWeights {
    speed: f64,
    reasoning: f64,
    coding: f64,
    creative: f64,
    analytics: f64,
}

/// Scores queries against the capability matrix and picks a model
pub struct ModelRouter {
    catalog: ModelCatalog,
}

impl ModelRouter {
    /// Create a router over the given catalog. An empty catalog falls back
    /// to the built-in table so selection always has candidates.
    #[must_use]
    pub fn new(catalog: ModelCatalog) -> Self {
        let catalog = if catalog.is_empty() {
            ModelCatalog::builtin()
        } else {
            catalog
        };
        Self { catalog }
    }

    /// Create a router over the built-in capability matrix
    #[must_use]
    pub fn with_builtin_catalog() -> Self {
        Self::new(ModelCatalog::builtin())
    }

    /// Get catalog reference
    #[must_use]
    pub const fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Select the best model for a query. Never fails: an imperfect match
    /// still yields the highest-scoring available model.
    #[must_use]
    pub fn select_model(
        &self,
        query: &str,
        preferences: Option<&RoutingPreferences>,
    ) -> RoutingDecision {
        let default_prefs = RoutingPreferences::default();
        let prefs = preferences.unwrap_or(&default_prefs);

        let analysis = analyze_query(query);
        let priorities = derive_priorities(&analysis);
        debug!(
            "Routing analysis: complexity={} domain={}",
            analysis.complexity, analysis.domain
        );

        let mut scored: Vec<(&ModelCapability, f64)> = self
            .catalog
            .models()
            .iter()
            .filter(|m| m.available)
            .map(|m| (m, score_model(m, &priorities, &analysis, prefs)))
            .collect();

        // A catalog with nothing marked available still yields a decision
        if scored.is_empty() {
            scored = self
                .catalog
                .models()
                .iter()
                .map(|m| (m, score_model(m, &priorities, &analysis, prefs)))
                .collect();
        }

        // Stable sort so tied scores keep catalog order and repeated calls
        // return identical decisions
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let recommendations: Vec<ModelRecommendation> = scored
            .iter()
            .take(RECOMMENDATION_COUNT)
            .map(|(m, score)| ModelRecommendation {
                model: m.model.clone(),
                provider: m.provider.clone(),
                display_name: m.display_name.clone(),
                score: *score,
                estimated_cost: estimate_cost(m, analysis.estimated_tokens),
            })
            .collect();

        let (top_model, top_score) = scored[0];
        let reasoning = build_reasoning(&analysis, &priorities, top_model, prefs);
        let confidence =
            (f64::from(analysis.confidence) * 0.7 + (top_score / 100.0) * 0.3).min(0.95) as f32;

        info!(
            "Selected model {} (score {:.1}, confidence {:.2})",
            top_model.model, top_score, confidence
        );

        RoutingDecision {
            selected_model: top_model.model.clone(),
            selected_provider: top_model.provider.clone(),
            display_name: top_model.display_name.clone(),
            analysis,
            recommendations,
            reasoning,
            confidence,
        }
    }
}

impl Default for ModelRouter {
    fn default() -> Self {
        Self::with_builtin_catalog()
    }
}

/// Translate the analysis into per-axis priorities: complexity sets the
/// base bias, the domain floors its matching capability, requirement flags
/// floor their axis
fn derive_priorities(analysis: &QueryAnalysis) -> PriorityWeights {
    let mut p = match analysis.complexity {
        QueryComplexity::Simple => PriorityWeights {
            speed: 0.9,
            reasoning: 0.3,
            coding: 0.2,
            creative: 0.2,
            analytics: 0.2,
        },
        QueryComplexity::Moderate => PriorityWeights {
            speed: 0.6,
            reasoning: 0.6,
            coding: 0.3,
            creative: 0.3,
            analytics: 0.3,
        },
        QueryComplexity::Complex => PriorityWeights {
            speed: 0.3,
            reasoning: 0.95,
            coding: 0.4,
            creative: 0.4,
            analytics: 0.4,
        },
    };

    match analysis.domain {
        QueryDomain::Coding => {
            p.coding = p.coding.max(0.95);
            p.reasoning = p.reasoning.max(0.8);
        }
        QueryDomain::Creative => {
            p.creative = p.creative.max(0.95);
            p.reasoning = p.reasoning.max(0.7);
        }
        QueryDomain::Analytics => {
            p.analytics = p.analytics.max(0.95);
            p.reasoning = p.reasoning.max(0.85);
        }
        QueryDomain::Technical => {
            p.reasoning = p.reasoning.max(0.95);
        }
        QueryDomain::General => {}
    }

    let req = &analysis.requirements;
    if req.needs_reasoning {
        p.reasoning = p.reasoning.max(REQUIREMENT_FLOOR);
    }
    if req.needs_creativity {
        p.creative = p.creative.max(REQUIREMENT_FLOOR);
    }
    if req.needs_code_generation {
        p.coding = p.coding.max(REQUIREMENT_FLOOR);
    }
    if req.needs_data_analysis {
        p.analytics = p.analytics.max(REQUIREMENT_FLOOR);
    }

    p
}

/// Weighted capability sum, then additive preference bonuses, then
/// multiplicative constraint penalties, in that order
fn score_model(
    model: &ModelCapability,
    priorities: &PriorityWeights,
    analysis: &QueryAnalysis,
    preferences: &RoutingPreferences,
) -> f64 {
    let mut score = model.speed * priorities.speed * SPEED_WEIGHT
        + model.reasoning * priorities.reasoning * REASONING_WEIGHT
        + model.coding * priorities.coding * CODING_WEIGHT
        + model.creative * priorities.creative * CREATIVE_WEIGHT
        + model.analytics * priorities.analytics * ANALYTICS_WEIGHT;

    if preferences.prioritize_cost {
        score += if model.cost_per_1m_input == 0.0 {
            COST_BONUS_MAX
        } else {
            (COST_BONUS_MAX - model.cost_per_1m_input).max(0.0)
        };
    }
    if preferences.prioritize_speed {
        score += model.speed * SPEED_BONUS_WEIGHT;
    }
    if preferences.prioritize_quality {
        score += model.reasoning * QUALITY_BONUS_WEIGHT;
    }

    if let Some(max_cost) = preferences.max_cost_per_1m {
        if model.cost_per_1m_input > max_cost {
            score *= OVER_BUDGET_PENALTY;
        }
    }
    if analysis.requirements.needs_long_context && model.context_window < MIN_LONG_CONTEXT_WINDOW {
        score *= SHORT_CONTEXT_PENALTY;
    }
    if let Some(min_speed) = preferences.min_speed {
        if model.speed < min_speed {
            score *= SLOW_MODEL_PENALTY;
        }
    }

    score
}

/// Expected spend for this query on this model, in USD
fn estimate_cost(model: &ModelCapability, estimated_tokens: usize) -> f64 {
    estimated_tokens as f64 * (model.cost_per_1m_input + model.cost_per_1m_output) / 1_000_000.0
}

fn build_reasoning(
    analysis: &QueryAnalysis,
    priorities: &PriorityWeights,
    selected: &ModelCapability,
    preferences: &RoutingPreferences,
) -> String {
    let complexity_label = match analysis.complexity {
        QueryComplexity::Simple => "Simple",
        QueryComplexity::Moderate => "Moderate",
        QueryComplexity::Complex => "Complex",
    };
    let mut parts = vec![format!("{} {} query", complexity_label, analysis.domain)];

    let mut strengths: Vec<&str> = Vec::new();
    if selected.reasoning > CALLOUT_CAPABILITY && priorities.reasoning > CALLOUT_PRIORITY {
        strengths.push("strong reasoning");
    }
    if selected.coding > CALLOUT_CAPABILITY && priorities.coding > CALLOUT_PRIORITY {
        strengths.push("excellent at coding");
    }
    if selected.creative > CALLOUT_CAPABILITY && priorities.creative > CALLOUT_PRIORITY {
        strengths.push("excellent at creative writing");
    }
    if selected.analytics > CALLOUT_CAPABILITY && priorities.analytics > CALLOUT_PRIORITY {
        strengths.push("strong data analysis");
    }
    if selected.speed > CALLOUT_CAPABILITY && priorities.speed > CALLOUT_PRIORITY {
        strengths.push("very fast");
    }
    if !strengths.is_empty() {
        parts.push(format!("{} is {}", selected.display_name, strengths.join(", ")));
    }

    if analysis.requirements.needs_long_context && selected.context_window > LARGE_CONTEXT_WINDOW {
        parts.push(format!(
            "{} handles 100k+ token context",
            selected.display_name
        ));
    }

    let mut flags: Vec<&str> = Vec::new();
    if preferences.prioritize_cost {
        flags.push("cost");
    }
    if preferences.prioritize_speed {
        flags.push("speed");
    }
    if preferences.prioritize_quality {
        flags.push("quality");
    }
    if !flags.is_empty() {
        parts.push(format!("preferences active: {}", flags.join(", ")));
    }

    format!("{}.", parts.join(". "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capability(
        model: &str,
        speed: f64,
        reasoning: f64,
        cost_in: f64,
        cost_out: f64,
        context_window: usize,
    ) -> ModelCapability {
        ModelCapability {
            model: model.to_string(),
            provider: "test".to_string(),
            display_name: model.to_string(),
            context_window,
            max_output_tokens: 8_192,
            speed,
            reasoning,
            coding: reasoning - 0.05,
            creative: reasoning - 0.1,
            analytics: reasoning - 0.05,
            cost_per_1m_input: cost_in,
            cost_per_1m_output: cost_out,
            available: true,
        }
    }

    fn tiny_catalog() -> ModelCatalog {
        ModelCatalog::new(vec![
            capability("premium", 0.7, 0.95, 8.0, 24.0, 200_000),
            capability("balanced", 0.85, 0.8, 1.0, 3.0, 128_000),
            capability("free-local", 0.8, 0.65, 0.0, 0.0, 128_000),
        ])
    }

    fn rank(decision: &RoutingDecision, model: &str) -> usize {
        decision
            .recommendations
            .iter()
            .position(|r| r.model == model)
            .unwrap()
    }

    #[test]
    fn selection_is_idempotent() {
        let router = ModelRouter::with_builtin_catalog();
        let a = router.select_model("Explain the pros and cons of microservices", None);
        let b = router.select_model("Explain the pros and cons of microservices", None);
        assert_eq!(a, b);
    }

    #[test]
    fn coding_query_selects_best_available_coder() {
        let router = ModelRouter::with_builtin_catalog();
        let decision =
            router.select_model("Write a TypeScript function to debounce API calls", None);

        assert_eq!(decision.analysis.domain, QueryDomain::Coding);
        let best_coder = router
            .catalog()
            .models()
            .iter()
            .filter(|m| m.available)
            .max_by(|a, b| a.coding.partial_cmp(&b.coding).unwrap())
            .unwrap();
        assert_eq!(decision.selected_model, best_coder.model);
        assert!(decision.reasoning.contains("coding"));
    }

    #[test]
    fn cost_preference_never_demotes_the_free_model() {
        let router = ModelRouter::new(tiny_catalog());
        let query = "Summarize recent activity";

        let baseline = router.select_model(query, None);
        let prefs = RoutingPreferences {
            prioritize_cost: true,
            ..RoutingPreferences::default()
        };
        let with_cost = router.select_model(query, Some(&prefs));

        assert!(rank(&with_cost, "free-local") <= rank(&baseline, "free-local"));
    }

    #[test]
    fn max_cost_cap_demotes_expensive_models() {
        let router = ModelRouter::new(tiny_catalog());
        let prefs = RoutingPreferences {
            max_cost_per_1m: Some(2.0),
            ..RoutingPreferences::default()
        };
        let decision = router.select_model("Summarize recent activity", Some(&prefs));

        // Premium exceeds the cap; without it premium would rank first
        assert_ne!(decision.selected_model, "premium");
        assert_eq!(rank(&decision, "premium"), 2);
    }

    #[test]
    fn long_context_need_penalizes_small_windows() {
        let catalog = ModelCatalog::new(vec![
            capability("tiny-window", 0.8, 0.8, 1.0, 3.0, 8_000),
            capability("roomy", 0.8, 0.8, 1.0, 3.0, 200_000),
        ]);
        let router = ModelRouter::new(catalog);

        let decision = router.select_model("summarize this document", None);
        assert!(decision.analysis.requirements.needs_long_context);
        assert_eq!(decision.selected_model, "roomy");
    }

    #[test]
    fn min_speed_penalizes_slow_models() {
        let router = ModelRouter::new(tiny_catalog());
        let prefs = RoutingPreferences {
            min_speed: Some(0.8),
            ..RoutingPreferences::default()
        };
        let decision = router.select_model("Summarize recent activity", Some(&prefs));
        assert_eq!(decision.selected_model, "balanced");
    }

    #[test]
    fn speed_preference_shifts_selection() {
        let router = ModelRouter::new(tiny_catalog());
        let prefs = RoutingPreferences {
            prioritize_speed: true,
            ..RoutingPreferences::default()
        };
        let decision = router.select_model("Summarize recent activity", Some(&prefs));
        assert_eq!(decision.selected_model, "balanced");
        assert!(decision.reasoning.contains("speed"));
    }

    #[test]
    fn unavailable_models_are_never_selected() {
        let router = ModelRouter::with_builtin_catalog();
        let decision = router.select_model("analyze the dataset trends in depth", None);

        assert_ne!(decision.selected_model, "gpt-5-preview");
        assert!(decision
            .recommendations
            .iter()
            .all(|r| r.model != "gpt-5-preview"));
    }

    #[test]
    fn recommendations_are_sorted_and_capped() {
        let router = ModelRouter::with_builtin_catalog();
        let decision = router.select_model("what should I look at first?", None);

        assert!(decision.recommendations.len() <= RECOMMENDATION_COUNT);
        assert!(!decision.recommendations.is_empty());
        assert!(decision
            .recommendations
            .windows(2)
            .all(|w| w[0].score >= w[1].score));
        assert_eq!(decision.recommendations[0].model, decision.selected_model);
    }

    #[test]
    fn confidence_stays_in_bounds() {
        let router = ModelRouter::with_builtin_catalog();
        for query in ["hi", "", "analyze everything about our deployment architecture"] {
            let decision = router.select_model(query, None);
            assert!(decision.confidence > 0.0 && decision.confidence <= 0.95);
        }
    }

    #[test]
    fn free_model_cost_estimate_is_zero() {
        let router = ModelRouter::new(tiny_catalog());
        let prefs = RoutingPreferences {
            prioritize_cost: true,
            ..RoutingPreferences::default()
        };
        let decision = router.select_model("Summarize recent activity", Some(&prefs));

        let free = &decision.recommendations[rank(&decision, "free-local")];
        assert_eq!(free.estimated_cost, 0.0);
        let premium = &decision.recommendations[rank(&decision, "premium")];
        assert!(premium.estimated_cost > 0.0);
    }

    #[test]
    fn empty_catalog_falls_back_to_builtin() {
        let router = ModelRouter::new(ModelCatalog::new(vec![]));
        let decision = router.select_model("hello", None);
        assert!(!decision.selected_model.is_empty());
    }
}
