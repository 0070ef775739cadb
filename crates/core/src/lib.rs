//! yt2blog Core Library
//!
//! Turns YouTube video content into a blog article by drafting it in three
//! styles concurrently, critiquing each draft and refining the results into a
//! single article.

pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod llm;
pub mod pipeline;
pub mod pricing;
pub mod progress;
pub mod prompt;
pub mod provider;
pub mod review;
pub mod styles;
pub mod types;
pub mod validation;
pub mod web_search;
pub mod youtube;

// Re-export commonly used items at crate root
pub use config::PipelineConfig;
pub use error::{Result, Yt2BlogError};
pub use events::{EnrichedEvent, EventBus, EventReceiver, PipelineEvent};
pub use format::{format_usage_report, format_verification};
pub use llm::{ChatClient, ChatRequest, Completion, HttpChatClient, TokenUsage};
pub use pipeline::ArticlePipeline;
pub use pricing::{UsageLedger, UsageSummary, calculate_token_cost, format_cost};
pub use progress::{ProgressStatus, ProgressTracker, Stage};
pub use provider::{Provider, ProviderConfig};
pub use types::{
    ArticleVerification, ContentSet, DraftResult, GenerationRequest, TokenCost, VideoContent,
    WebSearchResult, WebSource,
};
pub use validation::{Credentials, ValidationError, validate_inputs, validate_request};
pub use youtube::{ContentSource, YoutubeClient, collect_content};
