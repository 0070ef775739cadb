//! Standalone article verification and instruction enhancement.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    error::Result,
    llm::ChatRequest,
    pipeline::ArticlePipeline,
    prompt::{
        ENHANCER_SYSTEM_PROMPT, VERIFIER_SYSTEM_PROMPT, enhancement_prompt, verification_prompt,
    },
    types::ArticleVerification,
    validation::ValidationError,
};

pub const DEFAULT_QUALITY_SCORE: u32 = 7;
pub const PASSING_SCORE: u32 = 7;

const VERIFIER_TEMPERATURE: f32 = 0.3;
const ENHANCER_TEMPERATURE: f32 = 0.7;

static OUT_OF_TEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(10|[1-9])\s*/\s*10\b").expect("static regex is valid"));

static BARE_SCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(10|[1-9])\b").expect("static regex is valid"));

/// Overall 1-10 score of a verifier analysis.
///
/// Averages explicit `N/10` scores when present, otherwise every standalone
/// number from 1 to 10. Falls back to [`DEFAULT_QUALITY_SCORE`].
pub fn parse_quality_score(analysis: &str) -> u32 {
    let collect = |re: &Regex| -> Vec<u32> {
        re.captures_iter(analysis)
            .filter_map(|c| c.get(1)?.as_str().parse().ok())
            .collect()
    };

    let mut scores = collect(&OUT_OF_TEN);
    if scores.is_empty() {
        scores = collect(&BARE_SCORE);
    }
    if scores.is_empty() {
        return DEFAULT_QUALITY_SCORE;
    }

    let mean = scores.iter().sum::<u32>() as f64 / scores.len() as f64;
    mean.round() as u32
}

impl ArticlePipeline {
    /// Ask a QA model to score `article` against `instruction`.
    pub async fn verify_article(
        &self,
        api_key: &str,
        article: &str,
        instruction: &str,
    ) -> Result<ArticleVerification> {
        if api_key.trim().is_empty() {
            return Err(ValidationError::MissingApiKey.into());
        }
        if article.trim().is_empty() {
            return Err(ValidationError::EmptyArticle.into());
        }
        if instruction.trim().is_empty() {
            return Err(ValidationError::EmptyInstruction.into());
        }

        tracing::info!("analyzing article quality");
        let request = ChatRequest::new(
            "analyze article",
            self.config().model(),
            VERIFIER_SYSTEM_PROMPT,
            verification_prompt(article, instruction),
            VERIFIER_TEMPERATURE,
        );
        let completion = self.client().complete(api_key, request).await?;
        self.bus()
            .token_usage(completion.token_cost("Article verification"));

        let score = parse_quality_score(&completion.content);
        Ok(ArticleVerification {
            score,
            analysis: completion.content,
            passed: score >= PASSING_SCORE,
        })
    }

    /// Rewrite `instruction` into a more specific prompt for the generator.
    pub async fn enhance_instructions(&self, api_key: &str, instruction: &str) -> Result<String> {
        if api_key.trim().is_empty() {
            return Err(ValidationError::MissingApiKey.into());
        }
        if instruction.trim().chars().count() < 3 {
            return Err(ValidationError::EmptyInstruction.into());
        }

        tracing::info!("enhancing user instructions");
        let request = ChatRequest::new(
            "enhance instructions",
            self.config().model(),
            ENHANCER_SYSTEM_PROMPT,
            enhancement_prompt(instruction.trim()),
            ENHANCER_TEMPERATURE,
        );
        let completion = self.client().complete(api_key, request).await?;
        self.bus()
            .token_usage(completion.token_cost("Instruction enhancement"));

        Ok(completion.content)
    }
}
