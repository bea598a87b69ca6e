//! Static model capability matrix
//!
//! The catalog is read-only configuration injected into the router at
//! construction. Capability axes are hand-calibrated scores in `[0,1]`;
//! costs are USD per million tokens.

use serde::{Deserialize, Serialize};

/// Capability and cost profile for one routable model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCapability {
    pub model: String,
    pub provider: String,
    pub display_name: String,
    pub context_window: usize,
    pub max_output_tokens: usize,
    pub speed: f64,
    pub reasoning: f64,
    pub coding: f64,
    pub creative: f64,
    pub analytics: f64,
    pub cost_per_1m_input: f64,
    pub cost_per_1m_output: f64,
    pub available: bool,
}

/// Immutable model table the router scores against
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    models: Vec<ModelCapability>,
}

impl ModelCatalog {
    /// Build a catalog from an explicit model list
    #[must_use]
    pub fn new(models: Vec<ModelCapability>) -> Self {
        Self { models }
    }

    /// All catalog entries, available or not
    #[must_use]
    pub fn models(&self) -> &[ModelCapability] {
        &self.models
    }

    /// Look up one entry by model id
    #[must_use]
    pub fn get(&self, model: &str) -> Option<&ModelCapability> {
        self.models.iter().find(|m| m.model == model)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// The built-in capability matrix. Guaranteed to contain at least one
    /// available model.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(vec![
            ModelCapability {
                model: "gpt-4o".to_string(),
                provider: "openai".to_string(),
                display_name: "GPT-4o".to_string(),
                context_window: 128_000,
                max_output_tokens: 16_384,
                speed: 0.75,
                reasoning: 0.92,
                coding: 0.90,
                creative: 0.88,
                analytics: 0.90,
                cost_per_1m_input: 2.50,
                cost_per_1m_output: 10.00,
                available: true,
            },
            ModelCapability {
                model: "gpt-4o-mini".to_string(),
                provider: "openai".to_string(),
                display_name: "GPT-4o Mini".to_string(),
                context_window: 128_000,
                max_output_tokens: 16_384,
                speed: 0.92,
                reasoning: 0.78,
                coding: 0.80,
                creative: 0.75,
                analytics: 0.78,
                cost_per_1m_input: 0.15,
                cost_per_1m_output: 0.60,
                available: true,
            },
            ModelCapability {
                model: "claude-sonnet-4".to_string(),
                provider: "anthropic".to_string(),
                display_name: "Claude Sonnet 4".to_string(),
                context_window: 200_000,
                max_output_tokens: 64_000,
                speed: 0.80,
                reasoning: 0.94,
                coding: 0.95,
                creative: 0.90,
                analytics: 0.92,
                cost_per_1m_input: 3.00,
                cost_per_1m_output: 15.00,
                available: true,
            },
            ModelCapability {
                model: "claude-3-5-haiku".to_string(),
                provider: "anthropic".to_string(),
                display_name: "Claude 3.5 Haiku".to_string(),
                context_window: 200_000,
                max_output_tokens: 8_192,
                speed: 0.95,
                reasoning: 0.80,
                coding: 0.84,
                creative: 0.78,
                analytics: 0.80,
                cost_per_1m_input: 0.80,
                cost_per_1m_output: 4.00,
                available: true,
            },
            ModelCapability {
                model: "gemini-2.0-flash".to_string(),
                provider: "google".to_string(),
                display_name: "Gemini 2.0 Flash".to_string(),
                context_window: 1_000_000,
                max_output_tokens: 8_192,
                speed: 0.93,
                reasoning: 0.82,
                coding: 0.82,
                creative: 0.80,
                analytics: 0.85,
                cost_per_1m_input: 0.10,
                cost_per_1m_output: 0.40,
                available: true,
            },
            ModelCapability {
                model: "llama3.1:8b".to_string(),
                provider: "ollama".to_string(),
                display_name: "Llama 3.1 8B (local)".to_string(),
                context_window: 128_000,
                max_output_tokens: 8_192,
                speed: 0.85,
                reasoning: 0.68,
                coding: 0.66,
                creative: 0.70,
                analytics: 0.65,
                cost_per_1m_input: 0.0,
                cost_per_1m_output: 0.0,
                available: true,
            },
            ModelCapability {
                model: "mistral-small".to_string(),
                provider: "mistral".to_string(),
                display_name: "Mistral Small".to_string(),
                context_window: 32_000,
                max_output_tokens: 8_192,
                speed: 0.88,
                reasoning: 0.74,
                coding: 0.75,
                creative: 0.72,
                analytics: 0.70,
                cost_per_1m_input: 0.20,
                cost_per_1m_output: 0.60,
                available: true,
            },
            ModelCapability {
                model: "phi-3-mini".to_string(),
                provider: "ollama".to_string(),
                display_name: "Phi-3 Mini (local)".to_string(),
                context_window: 16_000,
                max_output_tokens: 4_096,
                speed: 0.90,
                reasoning: 0.62,
                coding: 0.60,
                creative: 0.58,
                analytics: 0.60,
                cost_per_1m_input: 0.0,
                cost_per_1m_output: 0.0,
                available: true,
            },
            ModelCapability {
                model: "gpt-5-preview".to_string(),
                provider: "openai".to_string(),
                display_name: "GPT-5 (preview)".to_string(),
                context_window: 400_000,
                max_output_tokens: 128_000,
                speed: 0.70,
                reasoning: 0.97,
                coding: 0.96,
                creative: 0.93,
                analytics: 0.95,
                cost_per_1m_input: 10.00,
                cost_per_1m_output: 30.00,
                available: false,
            },
        ])
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_available_models() {
        let catalog = ModelCatalog::builtin();
        assert!(!catalog.is_empty());
        assert!(catalog.models().iter().any(|m| m.available));
    }

    #[test]
    fn builtin_axes_are_normalized() {
        for m in ModelCatalog::builtin().models() {
            for axis in [m.speed, m.reasoning, m.coding, m.creative, m.analytics] {
                assert!((0.0..=1.0).contains(&axis), "{} axis out of range", m.model);
            }
            assert!(m.cost_per_1m_input >= 0.0);
            assert!(m.cost_per_1m_output >= 0.0);
            assert!(m.context_window > 0);
        }
    }

    #[test]
    fn builtin_includes_a_zero_cost_model() {
        let catalog = ModelCatalog::builtin();
        assert!(catalog
            .models()
            .iter()
            .any(|m| m.available && m.cost_per_1m_input == 0.0));
    }

    #[test]
    fn lookup_by_id() {
        let catalog = ModelCatalog::builtin();
        let model = catalog.get("claude-sonnet-4");
        assert!(model.is_some());
        assert_eq!(model.map(|m| m.provider.as_str()), Some("anthropic"));
        assert!(catalog.get("nonexistent-model").is_none());
    }
}
