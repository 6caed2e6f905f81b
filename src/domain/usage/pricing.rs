//! Model pricing and cost estimation

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::llm::Usage;

/// Per-1K-token prices for one (provider, model) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub provider: String,
    pub model: String,
    pub input_per_1k_usd: f64,
    pub output_per_1k_usd: f64,
}

impl ModelPricing {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        input_per_1k_usd: f64,
        output_per_1k_usd: f64,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            input_per_1k_usd,
            output_per_1k_usd,
        }
    }

    fn input_price_per_1k_micros(&self) -> i64 {
        (self.input_per_1k_usd * 1_000_000.0).round() as i64
    }

    fn output_price_per_1k_micros(&self) -> i64 {
        (self.output_per_1k_usd * 1_000_000.0).round() as i64
    }

    /// Cost in micro-dollars
    pub fn calculate_cost(&self, input_tokens: u32, output_tokens: u32) -> i64 {
        let input_cost = (input_tokens as i64 * self.input_price_per_1k_micros()) / 1000;
        let output_cost = (output_tokens as i64 * self.output_price_per_1k_micros()) / 1000;

        input_cost + output_cost
    }

    pub fn calculate_cost_usd(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        self.calculate_cost(input_tokens, output_tokens) as f64 / 1_000_000.0
    }
}

/// Price lookup by (provider, model). Unknown pairs cost nothing.
#[derive(Debug, Clone, Default)]
pub struct PricingTable {
    prices: HashMap<(String, String), ModelPricing>,
}

impl PricingTable {
    pub fn new(entries: impl IntoIterator<Item = ModelPricing>) -> Self {
        let mut table = Self::default();
        for entry in entries {
            table.insert(entry);
        }
        table
    }

    /// Published list prices for common OpenAI and Anthropic models
    pub fn with_defaults() -> Self {
        Self::new(default_model_pricing())
    }

    /// Add or replace the price for an entry's (provider, model)
    pub fn insert(&mut self, pricing: ModelPricing) {
        self.prices
            .insert((pricing.provider.clone(), pricing.model.clone()), pricing);
    }

    pub fn get(&self, provider: &str, model: &str) -> Option<&ModelPricing> {
        self.prices.get(&(provider.to_string(), model.to_string()))
    }

    /// Cost in micro-dollars
    pub fn cost_micros(&self, provider: &str, model: &str, usage: &Usage) -> i64 {
        self.get(provider, model)
            .map(|p| p.calculate_cost(usage.prompt_tokens, usage.completion_tokens))
            .unwrap_or(0)
    }

    pub fn cost_usd(&self, provider: &str, model: &str, usage: &Usage) -> f64 {
        self.cost_micros(provider, model, usage) as f64 / 1_000_000.0
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

fn default_model_pricing() -> Vec<ModelPricing> {
    vec![
        ModelPricing::new("openai", "gpt-4o", 0.0025, 0.01),
        ModelPricing::new("openai", "gpt-4o-mini", 0.00015, 0.0006),
        ModelPricing::new("openai", "gpt-4-turbo", 0.01, 0.03),
        ModelPricing::new("openai", "gpt-3.5-turbo", 0.0005, 0.0015),
        ModelPricing::new("anthropic", "claude-3-5-sonnet-20241022", 0.003, 0.015),
        ModelPricing::new("anthropic", "claude-3-5-haiku-20241022", 0.0008, 0.004),
        ModelPricing::new("anthropic", "claude-3-opus-20240229", 0.015, 0.075),
        ModelPricing::new("anthropic", "claude-3-haiku-20240307", 0.00025, 0.00125),
    ]
}
