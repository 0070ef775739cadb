//! Token pricing and usage accounting.

use std::{collections::BTreeMap, time::SystemTime};

use serde::Serialize;

use crate::types::TokenCost;

pub const DEFAULT_PRICED_MODEL: &str = "gpt-4o";

/// Price in USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input: f64,
    pub output: f64,
}

const PRICING: &[(&str, ModelPricing)] = &[
    ("gpt-4.1", ModelPricing { input: 2.00, output: 0.50 }),
    ("gpt-4.1-2025-04-14", ModelPricing { input: 2.00, output: 0.50 }),
    ("gpt-4o", ModelPricing { input: 2.50, output: 1.25 }),
    ("gpt-4o-2024-08-06", ModelPricing { input: 2.50, output: 1.25 }),
    ("gpt-4o-mini-search-preview", ModelPricing { input: 0.15, output: 0.60 }),
    (
        "gpt-4o-mini-search-preview-2025-03-11",
        ModelPricing { input: 0.15, output: 0.60 },
    ),
];

fn lookup(model: &str) -> Option<(&'static str, ModelPricing)> {
    PRICING.iter().find(|(name, _)| *name == model).copied()
}

/// Price a call. Models missing from the table are priced (and reported) as `gpt-4o`.
pub fn calculate_token_cost(
    model: &str,
    input_tokens: u64,
    output_tokens: u64,
    operation: &str,
) -> TokenCost {
    let (model, pricing) = lookup(model)
        .or_else(|| lookup(DEFAULT_PRICED_MODEL))
        .unwrap_or((DEFAULT_PRICED_MODEL, ModelPricing { input: 2.50, output: 1.25 }));

    let input_cost = input_tokens as f64 / 1_000_000.0 * pricing.input;
    let output_cost = output_tokens as f64 / 1_000_000.0 * pricing.output;

    TokenCost {
        model: model.to_string(),
        operation: operation.to_string(),
        timestamp: SystemTime::now(),
        input_tokens,
        output_tokens,
        total_tokens: input_tokens + output_tokens,
        input_cost,
        output_cost,
        total_cost: input_cost + output_cost,
    }
}

/// Format a USD amount with three decimals; any non-zero amount shows at least `$0.001`.
pub fn format_cost(cost: f64) -> String {
    if cost.is_nan() || cost <= 0.0 {
        return "$0.000".to_string();
    }
    if cost < 0.001 {
        return "$0.001".to_string();
    }
    format!("${:.3}", cost)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageSummary {
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub model_counts: BTreeMap<String, usize>,
    pub operation_counts: BTreeMap<String, usize>,
}

pub fn summarize_token_usage(usages: &[TokenCost]) -> UsageSummary {
    let mut summary = UsageSummary::default();

    for usage in usages {
        summary.total_input_tokens += usage.input_tokens;
        summary.total_output_tokens += usage.output_tokens;
        summary.total_cost += usage.total_cost;
        *summary.model_counts.entry(usage.model.clone()).or_default() += 1;
        *summary
            .operation_counts
            .entry(usage.operation.clone())
            .or_default() += 1;
    }
    summary.total_tokens = summary.total_input_tokens + summary.total_output_tokens;

    summary
}

/// Caller-side accumulator of per-call token costs.
#[derive(Debug, Default)]
pub struct UsageLedger {
    entries: Vec<TokenCost>,
}

impl UsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, cost: TokenCost) {
        self.entries.push(cost);
    }

    pub fn entries(&self) -> &[TokenCost] {
        &self.entries
    }

    pub fn summary(&self) -> UsageSummary {
        summarize_token_usage(&self.entries)
    }
}
