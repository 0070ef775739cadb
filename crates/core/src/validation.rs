//! Input checks run before any network call.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::{
    llm::{ChatClient, ChatMessage, ChatRequest},
    types::GenerationRequest,
};

pub const MIN_INSTRUCTION_CHARS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("API key is required")]
    MissingApiKey,

    #[error("Content is required")]
    EmptyContent,

    #[error("Instruction is required")]
    EmptyInstruction,

    #[error("Topic is required")]
    EmptyTopic,

    #[error("Article is required")]
    EmptyArticle,

    #[error("{field}: {message}")]
    Field {
        field: &'static str,
        message: String,
    },
}

/// Credentials for the two upstream services.
#[derive(Clone, Default)]
pub struct Credentials {
    pub youtube_api_key: String,
    pub llm_api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("youtube_api_key", &redact(&self.youtube_api_key))
            .field("llm_api_key", &redact(&self.llm_api_key))
            .finish()
    }
}

fn redact(key: &str) -> &'static str {
    if key.is_empty() { "<empty>" } else { "<redacted>" }
}

static YOUTUBE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{39}$").expect("static regex is valid"));

static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*(?:youtu\.be/|v/|u/\w/|embed/|shorts/|watch\?v=|&v=)([^#&?]*).*")
        .expect("static regex is valid")
});

pub fn is_valid_youtube_api_key_format(key: &str) -> bool {
    YOUTUBE_KEY.is_match(key)
}

/// Only presence is checked; a live call decides whether the key works.
pub fn is_valid_llm_api_key_format(key: &str) -> bool {
    !key.trim().is_empty()
}

/// The 11-character video id of a YouTube URL.
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID
        .captures(url.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|id| id.len() == 11)
        .map(str::to_string)
}

pub fn is_valid_youtube_url(url: &str) -> bool {
    extract_video_id(url).is_some()
}

/// Preconditions of a generation request.
pub fn validate_request(request: &GenerationRequest) -> Result<(), ValidationError> {
    if request.api_key.trim().is_empty() {
        return Err(ValidationError::MissingApiKey);
    }
    if request.content.is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    if request.instruction.trim().is_empty() {
        return Err(ValidationError::EmptyInstruction);
    }
    Ok(())
}

/// Check everything a user supplies before content is fetched.
///
/// Returns every problem found, in field order.
pub fn validate_inputs(
    credentials: &Credentials,
    urls: &[String],
    instruction: &str,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let field = |field, message: &str| ValidationError::Field {
        field,
        message: message.to_string(),
    };

    if credentials.youtube_api_key.is_empty() {
        errors.push(field("youtube_api_key", "YouTube API key is required"));
    } else if !is_valid_youtube_api_key_format(&credentials.youtube_api_key) {
        errors.push(field("youtube_api_key", "Invalid YouTube API key format"));
    }

    if !is_valid_llm_api_key_format(&credentials.llm_api_key) {
        errors.push(field("llm_api_key", "LLM API key is required"));
    }

    if urls.iter().all(|u| u.trim().is_empty()) {
        errors.push(field("youtube_urls", "At least one YouTube URL is required"));
    } else {
        for url in urls {
            if url.trim().is_empty() {
                errors.push(field("youtube_urls", "URL cannot be empty"));
            } else if !is_valid_youtube_url(url) {
                errors.push(ValidationError::Field {
                    field: "youtube_urls",
                    message: format!("Invalid YouTube URL: {url}"),
                });
            }
        }
    }

    let instruction = instruction.trim();
    if instruction.is_empty() {
        errors.push(field("instruction", "Instruction is required"));
    } else if instruction.chars().count() < MIN_INSTRUCTION_CHARS {
        errors.push(field(
            "instruction",
            "Instruction is too short (minimum 10 characters)",
        ));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Probe the LLM key with a five-token completion. Any failure means invalid.
pub async fn check_llm_api_key(client: &dyn ChatClient, api_key: &str, model: &str) -> bool {
    if !is_valid_llm_api_key_format(api_key) {
        return false;
    }

    let request = ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::user("Hello world")],
        temperature: 1.0,
        max_tokens: Some(5),
        action: "validate API key",
    };

    match client.complete(api_key, request).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "LLM API key check failed");
            false
        }
    }
}
