//! Chat completion boundary.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, Yt2BlogError},
    pricing::calculate_token_cost,
    types::TokenCost,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Body of a chat completion call.
///
/// `action` names the call in error messages ("Failed to <action>") and is not sent.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip)]
    pub action: &'static str,
}

impl ChatRequest {
    pub fn new(
        action: &'static str,
        model: impl Into<String>,
        system: impl Into<String>,
        user: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature,
            max_tokens: None,
            action,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Text of the first system message.
    pub fn system_prompt(&self) -> &str {
        self.messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }

    /// Text of the last user message.
    pub fn user_prompt(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }
}

/// Token counts as reported by the provider.
///
/// Accepts both `input_tokens`/`output_tokens` and the chat completion
/// `prompt_tokens`/`completion_tokens` spellings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedUsage {
    #[serde(default, alias = "prompt_tokens")]
    pub input_tokens: u64,
    #[serde(default, alias = "completion_tokens")]
    pub output_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Resolve provider usage into an input/output split.
    ///
    /// When only a total is reported, 30% (rounded) is attributed to input and
    /// the remainder to output.
    pub fn from_reported(usage: ReportedUsage) -> Self {
        if usage.input_tokens == 0 && usage.output_tokens == 0 && usage.total_tokens > 0 {
            let input_tokens = (usage.total_tokens as f64 * 0.3).round() as u64;
            return Self {
                input_tokens,
                output_tokens: usage.total_tokens - input_tokens,
            };
        }
        Self {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
        }
    }

    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// A successful chat completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
}

impl Completion {
    pub fn token_cost(&self, operation: &str) -> TokenCost {
        calculate_token_cost(
            &self.model,
            self.usage.input_tokens,
            self.usage.output_tokens,
            operation,
        )
    }
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<RawChoice>,
    #[serde(default)]
    usage: Option<ReportedUsage>,
}

#[derive(Debug, Deserialize)]
struct RawChoice {
    message: Option<RawMessage>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    content: Option<String>,
}

/// Turn an HTTP status and body into a completion or a classified error.
pub fn parse_completion(request: &ChatRequest, status: u16, body: &str) -> Result<Completion> {
    if status == 401 {
        return Err(Yt2BlogError::InvalidApiKey);
    }
    if !(200..300).contains(&status) {
        return Err(Yt2BlogError::upstream(request.action, status, body));
    }

    let raw: RawResponse =
        serde_json::from_str(body).map_err(|e| Yt2BlogError::MalformedResponse {
            action: request.action,
            reason: e.to_string(),
        })?;

    let content = raw
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or_else(|| Yt2BlogError::MalformedResponse {
            action: request.action,
            reason: "response has no choices[0].message.content".to_string(),
        })?;

    Ok(Completion {
        content,
        model: raw.model.unwrap_or_else(|| request.model.clone()),
        usage: TokenUsage::from_reported(raw.usage.unwrap_or_default()),
    })
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Run one chat completion authenticated with `api_key`.
    async fn complete(&self, api_key: &str, request: ChatRequest) -> Result<Completion>;
}

/// `ChatClient` speaking the OpenAI chat completions protocol over HTTP.
#[derive(Clone)]
pub struct HttpChatClient {
    http: reqwest::Client,
    api_url: String,
    timeout: Duration,
}

impl HttpChatClient {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            timeout,
        }
    }

    async fn send(&self, api_key: &str, request: &ChatRequest) -> Result<(u16, String)> {
        let response = self
            .http
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", api_key))
            .json(request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok((status, body))
    }
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn complete(&self, api_key: &str, request: ChatRequest) -> Result<Completion> {
        tracing::debug!(
            action = request.action,
            model = %request.model,
            temperature = request.temperature,
            "chat completion request"
        );

        let (status, body) = tokio::time::timeout(self.timeout, self.send(api_key, &request))
            .await
            .map_err(|_| Yt2BlogError::Timeout {
                action: request.action,
                secs: self.timeout.as_secs(),
            })??;

        let completion = parse_completion(&request, status, &body)?;
        tracing::debug!(
            action = request.action,
            input_tokens = completion.usage.input_tokens,
            output_tokens = completion.usage.output_tokens,
            "chat completion response"
        );
        Ok(completion)
    }
}
