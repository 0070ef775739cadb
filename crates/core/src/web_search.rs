//! Best-effort topic research used to enrich the drafting prompt.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    config::PipelineConfig,
    error::Result,
    events::EventBus,
    llm::{ChatClient, ChatRequest},
    prompt::{RESEARCH_SYSTEM_PROMPT, web_search_prompt},
    types::{WebSearchResult, WebSource},
    validation::ValidationError,
};

const WEB_SEARCH_TEMPERATURE: f32 = 0.2;

static SOURCES_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^[\s#>*_\-]*(?:key\s+)?(?:sources?|references)(?:[\s*_]*(:.*)?|\b[^:\n]{1,20}?(:.*))$",
    )
    .expect("static regex is valid")
});

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s<>()\[\]]+").expect("static regex is valid"));

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\d+[.)]|[-*•])\s*").expect("static regex is valid"));

/// Ask the model for recent facts and sources about `topic`.
pub async fn perform_web_search(
    client: &dyn ChatClient,
    api_key: &str,
    config: &PipelineConfig,
    topic: &str,
    bus: &EventBus,
) -> Result<WebSearchResult> {
    if topic.trim().is_empty() {
        return Err(ValidationError::EmptyTopic.into());
    }

    tracing::info!(topic, "performing web search");

    let request = ChatRequest::new(
        "perform web search",
        config.model(),
        RESEARCH_SYSTEM_PROMPT,
        web_search_prompt(topic),
        WEB_SEARCH_TEMPERATURE,
    )
    .with_max_tokens(config.web_search_max_tokens);

    let completion = client.complete(api_key, request).await?;
    bus.token_usage(completion.token_cost(&operation_label(topic)));

    let sources = parse_sources(&completion.content);
    tracing::debug!(sources = sources.len(), "parsed web search sources");

    Ok(WebSearchResult {
        summary: completion.content,
        sources,
    })
}

fn operation_label(topic: &str) -> String {
    let short: String = topic.chars().take(20).collect();
    format!("Web Search: {short}...")
}

/// Extract `{title, url}` entries from the last "Sources:" block of `text`.
///
/// The heading may also read `References`, or carry a few words before its
/// colon (`Sources used:`).
///
/// Lines without a URL get `#`; lines whose title is empty get `Source`.
/// Text without a sources heading yields no entries.
pub fn parse_sources(text: &str) -> Vec<WebSource> {
    let lines: Vec<&str> = text.lines().collect();

    let Some((idx, inline)) = lines.iter().enumerate().rev().find_map(|(i, line)| {
        SOURCES_HEADING.captures(line).map(|caps| {
            let rest = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().trim_start_matches(':'))
                .unwrap_or_default()
                .trim_matches(|c: char| c.is_whitespace() || c == '*' || c == '_');
            (i, rest)
        })
    }) else {
        return Vec::new();
    };

    std::iter::once(inline)
        .chain(lines[idx + 1..].iter().copied())
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_source_line)
        .collect()
}

fn parse_source_line(line: &str) -> WebSource {
    let url = URL
        .find(line)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':']))
        .unwrap_or_default();

    let without_url = if url.is_empty() {
        line.to_string()
    } else {
        line.replacen(url, "", 1)
    };
    let without_url = without_url.replace("()", "").replace("<>", "");

    let title = LIST_MARKER
        .replace(&without_url, "")
        .trim_matches(|c: char| c.is_whitespace() || "-–—:|[]*_.,".contains(c))
        .to_string();

    WebSource {
        title: if title.is_empty() {
            "Source".to_string()
        } else {
            title
        },
        url: if url.is_empty() {
            "#".to_string()
        } else {
            url.to_string()
        },
    }
}
