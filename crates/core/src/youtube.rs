//! YouTube Data API content source.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    error::{Result, Yt2BlogError},
    types::{ContentSet, VideoContent},
    validation::extract_video_id,
};

pub const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
pub const TRANSCRIPT_UNAVAILABLE: &str = "Transcript unavailable";

#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn scrape_content(&self, api_key: &str, url: &str) -> Result<VideoContent>;
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: VideoSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    published_at: String,
}

#[derive(Debug, Deserialize)]
struct CaptionListResponse {
    #[serde(default)]
    items: Vec<CaptionItem>,
}

#[derive(Debug, Deserialize)]
struct CaptionItem {
    id: String,
    snippet: CaptionSnippet,
}

#[derive(Debug, Deserialize)]
struct CaptionSnippet {
    #[serde(default)]
    language: String,
}

#[derive(Clone)]
pub struct YoutubeClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl YoutubeClient {
    pub fn new(timeout: Duration) -> Self {
        Self::with_base_url(YOUTUBE_API_BASE, timeout)
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout,
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        action: &'static str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let exchange = async {
            let response = self
                .http
                .get(format!("{}/{}", self.base_url, path))
                .query(query)
                .send()
                .await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, Yt2BlogError>((status, body))
        };

        let (status, body) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| Yt2BlogError::Timeout {
                action,
                secs: self.timeout.as_secs(),
            })??;

        if !(200..300).contains(&status) {
            return Err(Yt2BlogError::upstream(action, status, &body));
        }

        serde_json::from_str(&body).map_err(|e| Yt2BlogError::MalformedResponse {
            action,
            reason: e.to_string(),
        })
    }

    async fn fetch_video_details(&self, api_key: &str, video_id: &str) -> Result<VideoSnippet> {
        let response: VideoListResponse = self
            .get_json(
                "fetch video details",
                "videos",
                &[
                    ("part", "snippet,contentDetails"),
                    ("id", video_id),
                    ("key", api_key),
                ],
            )
            .await?;

        response
            .items
            .into_iter()
            .next()
            .map(|item| item.snippet)
            .ok_or_else(|| Yt2BlogError::VideoNotFound {
                video_id: video_id.to_string(),
            })
    }

    /// Look up caption tracks for `video_id`.
    ///
    /// Caption bodies are only downloadable with OAuth credentials, so with an
    /// API key this reports which track would be used rather than its text.
    async fn fetch_transcript(&self, api_key: &str, video_id: &str) -> Result<String> {
        let response: CaptionListResponse = self
            .get_json(
                "fetch captions",
                "captions",
                &[("part", "snippet"), ("videoId", video_id), ("key", api_key)],
            )
            .await?;

        let track = response
            .items
            .iter()
            .find(|c| c.snippet.language == "en" || c.snippet.language == "en-US")
            .or_else(|| response.items.first())
            .ok_or_else(|| Yt2BlogError::MalformedResponse {
                action: "fetch captions",
                reason: "No captions available for this video".to_string(),
            })?;

        Ok(format!(
            "Transcript for video {video_id} (caption track {} in {}; caption text requires OAuth access)",
            track.id, track.snippet.language
        ))
    }

    /// Probe `api_key` against the channels endpoint, retrying a public
    /// endpoint when the probe asks for user authentication.
    pub async fn check_api_key(&self, api_key: &str) -> bool {
        if api_key.is_empty() {
            return false;
        }

        let probe = |query: Vec<(&'static str, &'static str)>, path: &'static str| {
            let request = self
                .http
                .get(format!("{}/{}", self.base_url, path))
                .query(&query)
                .query(&[("key", api_key)])
                .send();
            tokio::time::timeout(self.timeout, request)
        };

        let status = match probe(
            vec![("part", "id"), ("mine", "true"), ("maxResults", "1")],
            "channels",
        )
        .await
        {
            Ok(Ok(response)) => response.status().as_u16(),
            _ => return false,
        };

        match status {
            400 | 403 => false,
            401 => matches!(
                probe(
                    vec![("part", "id"), ("chart", "mostPopular"), ("maxResults", "1")],
                    "videos",
                )
                .await,
                Ok(Ok(response)) if response.status().is_success()
            ),
            s => (200..300).contains(&s),
        }
    }
}

#[async_trait]
impl ContentSource for YoutubeClient {
    async fn scrape_content(&self, api_key: &str, url: &str) -> Result<VideoContent> {
        let video_id = extract_video_id(url).ok_or_else(|| Yt2BlogError::InvalidVideoUrl {
            url: url.to_string(),
        })?;

        let snippet = self.fetch_video_details(api_key, &video_id).await?;

        let transcript = match self.fetch_transcript(api_key, &video_id).await {
            Ok(transcript) => transcript,
            Err(e) => {
                tracing::warn!(video_id = %video_id, error = %e, "could not fetch transcript");
                TRANSCRIPT_UNAVAILABLE.to_string()
            }
        };

        Ok(VideoContent {
            video_id,
            url: url.to_string(),
            title: snippet.title,
            description: snippet.description,
            transcript,
            channel_title: snippet.channel_title,
            published_at: snippet.published_at,
        })
    }
}

/// Scrape every URL in order. The first failure aborts with the URL attached.
pub async fn collect_content(
    source: &dyn ContentSource,
    api_key: &str,
    urls: &[String],
) -> Result<ContentSet> {
    let mut content = ContentSet::new();

    for url in urls.iter().map(|u| u.trim()).filter(|u| !u.is_empty()) {
        tracing::info!(url, "scraping video content");
        let video = source
            .scrape_content(api_key, url)
            .await
            .map_err(|e| Yt2BlogError::Content {
                url: url.to_string(),
                source: Box::new(e),
            })?;
        content.insert(video);
    }

    Ok(content)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct FakeSource {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ContentSource for FakeSource {
        async fn scrape_content(&self, _api_key: &str, url: &str) -> Result<VideoContent> {
            self.calls.lock().unwrap().push(url.to_string());
            if url.contains("broken") {
                return Err(Yt2BlogError::VideoNotFound {
                    video_id: "broken".to_string(),
                });
            }
            Ok(VideoContent {
                video_id: "dQw4w9WgXcQ".to_string(),
                url: url.to_string(),
                title: format!("Title of {url}"),
                description: String::new(),
                transcript: String::new(),
                channel_title: String::new(),
                published_at: String::new(),
            })
        }
    }

    #[tokio::test]
    async fn collects_in_order_and_skips_blank_urls() {
        let source = FakeSource {
            calls: Mutex::new(Vec::new()),
        };
        let urls = vec!["https://a".to_string(), " ".to_string(), "https://b".to_string()];
        let content = collect_content(&source, "key", &urls).await.unwrap();

        assert_eq!(content.len(), 2);
        assert_eq!(content.topic(), "Title of https://a, Title of https://b");
    }

    #[tokio::test]
    async fn first_failure_aborts_with_url() {
        let source = FakeSource {
            calls: Mutex::new(Vec::new()),
        };
        let urls = vec![
            "https://broken".to_string(),
            "https://never-fetched".to_string(),
        ];
        let err = collect_content(&source, "key", &urls).await.unwrap_err();

        assert!(matches!(&err, Yt2BlogError::Content { url, .. } if url == "https://broken"));
        assert_eq!(*source.calls.lock().unwrap(), vec!["https://broken".to_string()]);
    }

    #[tokio::test]
    async fn stalled_body_read_times_out() {
        use tokio::{
            io::{AsyncReadExt, AsyncWriteExt},
            net::TcpListener,
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 512\r\n\r\n{\"items\":[",
                )
                .await
                .unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let client =
            YoutubeClient::with_base_url(format!("http://{addr}"), Duration::from_millis(300));
        let err = tokio::time::timeout(
            Duration::from_secs(5),
            client.fetch_video_details("key", "dQw4w9WgXcQ"),
        )
        .await
        .expect("request must be bounded by the client timeout")
        .unwrap_err();

        assert!(matches!(
            err,
            Yt2BlogError::Timeout {
                action: "fetch video details",
                ..
            }
        ));
    }

    #[test]
    fn parses_video_snippet() {
        let body = r#"{"items":[{"snippet":{"title":"T","description":"D","channelTitle":"C","publishedAt":"2024-01-01T00:00:00Z"}}]}"#;
        let parsed: VideoListResponse = serde_json::from_str(body).unwrap();
        let snippet = &parsed.items[0].snippet;
        assert_eq!(snippet.channel_title, "C");
        assert_eq!(snippet.published_at, "2024-01-01T00:00:00Z");
    }
}
