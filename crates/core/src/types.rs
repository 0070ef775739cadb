use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Metadata and transcript of a single video, as returned by a content source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoContent {
    pub video_id: String,
    pub url: String,
    pub title: String,
    pub description: String,
    pub transcript: String,
    pub channel_title: String,
    pub published_at: String,
}

/// Video content keyed by source URL, kept in the order the URLs were given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentSet {
    videos: Vec<VideoContent>,
}

impl ContentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `content` under its URL, replacing any previous entry for that URL.
    pub fn insert(&mut self, content: VideoContent) {
        match self.videos.iter_mut().find(|v| v.url == content.url) {
            Some(existing) => *existing = content,
            None => self.videos.push(content),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &VideoContent> {
        self.videos.iter()
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }

    /// Video titles joined with `", "`, used as the web search topic.
    pub fn topic(&self) -> String {
        self.videos
            .iter()
            .map(|v| v.title.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromIterator<VideoContent> for ContentSet {
    fn from_iter<I: IntoIterator<Item = VideoContent>>(iter: I) -> Self {
        let mut set = ContentSet::new();
        for content in iter {
            set.insert(content);
        }
        set
    }
}

/// Everything the pipeline needs for one article.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub api_key: String,
    pub content: ContentSet,
    pub instruction: String,
    pub keep_branding: bool,
    pub search_internet: bool,
    pub feedback: Option<String>,
}

/// One style's draft together with the critique written for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftResult {
    pub article: String,
    pub criticism: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSource {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSearchResult {
    pub summary: String,
    pub sources: Vec<WebSource>,
}

/// Token usage and cost of a single LLM call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenCost {
    pub model: String,
    pub operation: String,
    pub timestamp: SystemTime,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
}

/// Outcome of a standalone quality review of an article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleVerification {
    pub score: u32,
    pub analysis: String,
    pub passed: bool,
}
