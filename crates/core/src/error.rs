use thiserror::Error;

use crate::{provider::ProviderError, validation::ValidationError};

#[derive(Error, Debug)]
pub enum Yt2BlogError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid API key. Please check your key and try again.")]
    InvalidApiKey,

    #[error("{message}")]
    Upstream {
        action: &'static str,
        status: u16,
        message: String,
    },

    #[error("Malformed response while trying to {action}: {reason}")]
    MalformedResponse { action: &'static str, reason: String },

    #[error("Timed out after {secs}s while trying to {action}")]
    Timeout { action: &'static str, secs: u64 },

    #[error("Failed to scrape content from {url}: {source}")]
    Content {
        url: String,
        #[source]
        source: Box<Yt2BlogError>,
    },

    #[error("Invalid YouTube URL: {url}")]
    InvalidVideoUrl { url: String },

    #[error("Video not found: {video_id}")]
    VideoNotFound { video_id: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Config error in {path}: {reason}")]
    Config { path: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

impl Yt2BlogError {
    /// Build an upstream error from a non-2xx status and the raw response body.
    ///
    /// Uses the provider's `error.message` when the body carries one,
    /// otherwise falls back to `Failed to <action>`.
    pub fn upstream(action: &'static str, status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("Failed to {action}"));

        Yt2BlogError::Upstream {
            action,
            status,
            message,
        }
    }

    /// HTTP status reported by the upstream API, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Yt2BlogError::InvalidApiKey => Some(401),
            Yt2BlogError::Upstream { status, .. } => Some(*status),
            Yt2BlogError::ApiError(e) => e.status().map(|s| s.as_u16()),
            Yt2BlogError::Content { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Short, user-facing description suitable for a terminal or dialog.
    pub fn user_message(&self) -> String {
        match self.status() {
            Some(401) | Some(403) => {
                "Authentication failed. Please check your API key".to_string()
            }
            Some(404) => "Resource not found".to_string(),
            Some(429) => "Too many requests. Please try again later".to_string(),
            Some(s) if s >= 500 => "Server error. Please try again later".to_string(),
            _ => match self {
                Yt2BlogError::ApiError(e) if e.is_connect() || e.is_timeout() => {
                    "Network error. Please check your internet connection".to_string()
                }
                other => other.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, Yt2BlogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_prefers_provider_message() {
        let err = Yt2BlogError::upstream(
            "generate article",
            400,
            r#"{"error":{"message":"context length exceeded"}}"#,
        );
        assert_eq!(err.to_string(), "context length exceeded");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn upstream_falls_back_to_action() {
        let err = Yt2BlogError::upstream("generate criticism", 502, "<html>bad gateway</html>");
        assert_eq!(err.to_string(), "Failed to generate criticism");
        assert_eq!(err.user_message(), "Server error. Please try again later");
    }

    #[test]
    fn content_error_keeps_url_and_status() {
        let err = Yt2BlogError::Content {
            url: "https://youtu.be/abcdefghijk".to_string(),
            source: Box::new(Yt2BlogError::upstream("fetch video details", 403, "{}")),
        };
        assert!(err.to_string().contains("https://youtu.be/abcdefghijk"));
        assert_eq!(err.status(), Some(403));
        assert_eq!(
            err.user_message(),
            "Authentication failed. Please check your API key"
        );
    }
}
