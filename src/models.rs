//! Model catalog and cost estimation.
//!
//! This module provides a single source of truth for the models the engine
//! can route tasks to, and for computing the monetary cost of an exchange
//! from its token usage.

use serde::{Deserialize, Serialize};

/// Capability tier of a registered model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// Cheap, fast, good enough for light tasks
    Economy,
    /// Default workhorse tier
    Standard,
    /// Highest capability, highest price
    Premium,
    /// Web-search-backed research models
    Research,
}

/// A model known to the engine.
///
/// Pricing is in USD per million tokens, input and output priced
/// independently. Pricing is informational: it feeds the spend ledger and
/// never gates execution.
#[derive(Debug, Clone, Copy)]
pub struct ModelInfo {
    /// Provider-qualified identifier (OpenRouter format)
    pub id: &'static str,
    /// Human-readable display name
    pub name: &'static str,
    pub provider: &'static str,
    /// Context window in tokens
    pub context_window: u64,
    /// Maximum output tokens per completion
    pub max_output: u64,
    pub supports_tools: bool,
    pub supports_streaming: bool,
    pub input_price_per_m: f64,
    pub output_price_per_m: f64,
    pub tier: ModelTier,
}

/// All models the engine knows about.
///
/// Read-only; safe for unsynchronized concurrent access.
pub const MODEL_REGISTRY: &[ModelInfo] = &[
    ModelInfo {
        id: "anthropic/claude-sonnet-4",
        name: "Claude Sonnet 4",
        provider: "Anthropic",
        context_window: 200_000,
        max_output: 8_192,
        supports_tools: true,
        supports_streaming: true,
        input_price_per_m: 3.0,
        output_price_per_m: 15.0,
        tier: ModelTier::Standard,
    },
    ModelInfo {
        id: "anthropic/claude-opus-4",
        name: "Claude Opus 4",
        provider: "Anthropic",
        context_window: 200_000,
        max_output: 32_000,
        supports_tools: true,
        supports_streaming: true,
        input_price_per_m: 15.0,
        output_price_per_m: 75.0,
        tier: ModelTier::Premium,
    },
    ModelInfo {
        id: "openai/gpt-4o",
        name: "GPT-4o",
        provider: "OpenAI",
        context_window: 128_000,
        max_output: 16_384,
        supports_tools: true,
        supports_streaming: true,
        input_price_per_m: 2.5,
        output_price_per_m: 10.0,
        tier: ModelTier::Standard,
    },
    ModelInfo {
        id: "google/gemini-2.5-pro",
        name: "Gemini 2.5 Pro",
        provider: "Google",
        context_window: 1_000_000,
        max_output: 65_536,
        supports_tools: true,
        supports_streaming: true,
        input_price_per_m: 1.25,
        output_price_per_m: 10.0,
        tier: ModelTier::Standard,
    },
    ModelInfo {
        id: "perplexity/sonar-deep-research",
        name: "Sonar Deep Research",
        provider: "Perplexity",
        context_window: 128_000,
        max_output: 8_192,
        supports_tools: false,
        supports_streaming: true,
        input_price_per_m: 2.0,
        output_price_per_m: 8.0,
        tier: ModelTier::Research,
    },
    ModelInfo {
        id: "perplexity/sonar-pro",
        name: "Sonar Pro",
        provider: "Perplexity",
        context_window: 200_000,
        max_output: 8_192,
        supports_tools: false,
        supports_streaming: true,
        input_price_per_m: 3.0,
        output_price_per_m: 15.0,
        tier: ModelTier::Research,
    },
    ModelInfo {
        id: "anthropic/claude-3.5-haiku",
        name: "Claude 3.5 Haiku",
        provider: "Anthropic",
        context_window: 200_000,
        max_output: 8_192,
        supports_tools: true,
        supports_streaming: true,
        input_price_per_m: 0.8,
        output_price_per_m: 4.0,
        tier: ModelTier::Economy,
    },
];

/// Look up a model by its provider-qualified id. Returns None if unknown.
pub fn model_info(model_id: &str) -> Option<&'static ModelInfo> {
    MODEL_REGISTRY.iter().find(|m| m.id == model_id)
}

/// All registered models in a given tier.
pub fn models_by_tier(tier: ModelTier) -> Vec<&'static ModelInfo> {
    MODEL_REGISTRY.iter().filter(|m| m.tier == tier).collect()
}

/// Estimate the cost in USD of an exchange.
///
/// `(prompt_tokens / 1e6) * input_price + (completion_tokens / 1e6) * output_price`
///
/// Returns 0.0 for an unknown model id: pricing is informational, not
/// authoritative, so missing price data must never fail a run.
pub fn estimate_cost(prompt_tokens: u64, completion_tokens: u64, model_id: &str) -> f64 {
    let Some(model) = model_info(model_id) else {
        tracing::warn!(model = %model_id, "Unknown model for cost estimation, using 0 cost");
        return 0.0;
    };

    (prompt_tokens as f64 / 1_000_000.0) * model.input_price_per_m
        + (completion_tokens as f64 / 1_000_000.0) * model.output_price_per_m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_models() {
        assert!(model_info("anthropic/claude-sonnet-4").is_some());
        assert!(model_info("perplexity/sonar-pro").is_some());
        assert!(model_info("openai/gpt-4o").is_some());
    }

    #[test]
    fn test_lookup_unknown_model() {
        assert!(model_info("unknown-model-xyz").is_none());
        // Registry ids are fully qualified; bare names don't match.
        assert!(model_info("claude-sonnet-4").is_none());
    }

    #[test]
    fn test_research_models_have_no_tools() {
        for model in models_by_tier(ModelTier::Research) {
            assert!(
                !model.supports_tools,
                "research model {} should not advertise tool support",
                model.id
            );
        }
    }

    #[test]
    fn test_cost_basic() {
        // Claude Sonnet 4: $3/1M input, $15/1M output
        // 1M input + 1M output = $18
        let cost = estimate_cost(1_000_000, 1_000_000, "anthropic/claude-sonnet-4");
        assert!((cost - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_cost_fractional() {
        // 1000 input + 500 output on Sonnet 4
        // = 0.001 * 3.0 + 0.0005 * 15.0 = 0.0105
        let cost = estimate_cost(1000, 500, "anthropic/claude-sonnet-4");
        assert!((cost - 0.0105).abs() < 1e-9);
    }

    #[test]
    fn test_cost_zero_tokens() {
        assert_eq!(estimate_cost(0, 0, "anthropic/claude-sonnet-4"), 0.0);
        assert_eq!(estimate_cost(0, 0, "unknown-model"), 0.0);
    }

    #[test]
    fn test_cost_unknown_model_is_zero() {
        assert_eq!(estimate_cost(1_000_000, 1_000_000, "no-such/model"), 0.0);
    }
}
