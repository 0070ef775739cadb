use std::{sync::Mutex, time::Duration};

use async_trait::async_trait;
use yt2blog_core::{
    ArticlePipeline, ChatClient, ChatRequest, Completion, ContentSet, EventBus, EventReceiver,
    GenerationRequest, PipelineConfig, PipelineEvent, ProgressStatus, ProgressTracker, Stage,
    TokenCost, TokenUsage, VideoContent, Yt2BlogError,
    llm::ReportedUsage,
    prompt::{
        CRITIC_SYSTEM_PROMPT, REFINER_SYSTEM_PROMPT, RESEARCH_SYSTEM_PROMPT, WEB_SEARCH_MARKER,
        word_count,
    },
    styles::{ACADEMIC, CREATIVE, STYLES, TECHNICAL},
};

/// In-memory chat backend that answers by role and records every request.
#[derive(Default)]
struct ScriptedClient {
    calls: Mutex<Vec<ChatRequest>>,
    fail_system: Option<&'static str>,
    hang_system: Vec<&'static str>,
}

impl ScriptedClient {
    fn failing_on(system: &'static str) -> Self {
        Self {
            fail_system: Some(system),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<ChatRequest> {
        self.calls.lock().unwrap().clone()
    }

    fn calls_with_system(&self, system: &str) -> Vec<ChatRequest> {
        self.calls()
            .into_iter()
            .filter(|c| c.system_prompt() == system)
            .collect()
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn complete(&self, _api_key: &str, request: ChatRequest) -> yt2blog_core::Result<Completion> {
        self.calls.lock().unwrap().push(request.clone());
        let system = request.system_prompt().to_string();

        if self.hang_system.iter().any(|s| *s == system) {
            std::future::pending::<()>().await;
        }
        if self.fail_system == Some(system.as_str()) {
            return Err(Yt2BlogError::upstream(request.action, 500, "{}"));
        }

        let content = if system == RESEARCH_SYSTEM_PROMPT {
            "- Fact one\n- Fact two\n\nSources:\n1. Example Research https://example.com/research"
                .to_string()
        } else if system == CRITIC_SYSTEM_PROMPT {
            "The draft ignores the requested length.".to_string()
        } else if system == REFINER_SYSTEM_PROMPT {
            "# Final\n\nA friendly article.".to_string()
        } else {
            let label = STYLES
                .iter()
                .find(|s| s.system_prompt == system)
                .map(|s| s.label)
                .unwrap_or("Unknown");
            format!("{label} draft with a handful of words in it")
        };

        Ok(Completion {
            content,
            model: request.model.clone(),
            usage: TokenUsage::from_reported(ReportedUsage {
                input_tokens: 0,
                output_tokens: 0,
                total_tokens: 100,
            }),
        })
    }
}

fn request(search_internet: bool, keep_branding: bool) -> GenerationRequest {
    let content: ContentSet = [VideoContent {
        video_id: "dQw4w9WgXcQ".to_string(),
        url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
        title: "T".to_string(),
        description: "D".to_string(),
        transcript: "X".to_string(),
        channel_title: "Channel".to_string(),
        published_at: "2024-01-01T00:00:00Z".to_string(),
    }]
    .into_iter()
    .collect();

    GenerationRequest {
        api_key: "sk-test".to_string(),
        content,
        instruction: "Write 200 words in a friendly tone".to_string(),
        keep_branding,
        search_internet,
        feedback: None,
    }
}

fn drain(rx: &mut EventReceiver) -> Vec<PipelineEvent> {
    let mut events = Vec::new();
    while let Ok(e) = rx.try_recv() {
        events.push(e.event);
    }
    events
}

fn track(events: &[PipelineEvent]) -> ProgressTracker {
    let mut tracker = ProgressTracker::new();
    for event in events {
        if let PipelineEvent::Progress { stage, status } = event {
            tracker
                .apply(*stage, *status)
                .unwrap_or_else(|e| panic!("illegal progress sequence: {e}"));
        }
    }
    tracker
}

fn token_costs(events: &[PipelineEvent]) -> Vec<TokenCost> {
    events
        .iter()
        .filter_map(|e| match e {
            PipelineEvent::TokenUsage(cost) => Some(cost.clone()),
            _ => None,
        })
        .collect()
}

async fn run(
    client: ScriptedClient,
    request: &GenerationRequest,
) -> (
    std::sync::Arc<ScriptedClient>,
    yt2blog_core::Result<String>,
    Vec<PipelineEvent>,
) {
    let client = std::sync::Arc::new(client);
    let (bus, mut rx) = EventBus::new();
    let pipeline = ArticlePipeline::new(client.clone(), PipelineConfig::default(), bus);
    let result = tokio::time::timeout(Duration::from_secs(5), pipeline.generate_article(request))
        .await
        .expect("pipeline must not hang");
    (client, result, drain(&mut rx))
}

#[tokio::test]
async fn end_to_end_makes_seven_calls_without_search() {
    let (client, result, events) = run(ScriptedClient::default(), &request(false, false)).await;

    let article = result.unwrap();
    assert!(!article.trim().is_empty());

    let calls = client.calls();
    assert_eq!(calls.len(), 7);
    assert!(client.calls_with_system(RESEARCH_SYSTEM_PROMPT).is_empty());
    assert_eq!(client.calls_with_system(CRITIC_SYSTEM_PROMPT).len(), 3);
    for style in STYLES {
        let drafts = client.calls_with_system(style.system_prompt);
        assert_eq!(drafts.len(), 1, "{}", style.label);
        assert_eq!(drafts[0].temperature, style.temperature);
    }
    assert_eq!(calls.last().unwrap().system_prompt(), REFINER_SYSTEM_PROMPT);

    let tracker = track(&events);
    assert_eq!(
        tracker.history(Stage::GenerationAcademic),
        &[
            ProgressStatus::Pending,
            ProgressStatus::InProgress,
            ProgressStatus::Complete
        ]
    );
    for stage in Stage::ALL.into_iter().filter(|s| *s != Stage::WebSearch) {
        assert_eq!(tracker.status(stage), Some(ProgressStatus::Complete), "{stage}");
    }
    assert_eq!(tracker.status(Stage::WebSearch), None);
}

#[tokio::test]
async fn every_call_reports_estimated_token_split() {
    let (_, result, events) = run(ScriptedClient::default(), &request(false, false)).await;
    result.unwrap();

    let costs = token_costs(&events);
    assert_eq!(costs.len(), 7);
    for cost in &costs {
        assert_eq!(cost.input_tokens, 30);
        assert_eq!(cost.output_tokens, 70);
        assert_eq!(cost.total_tokens, 100);
    }
    assert!(costs.iter().any(|c| c.operation == "Final refinement"));
}

#[tokio::test]
async fn refinement_sees_three_drafts_and_critiques() {
    let (client, result, _) = run(ScriptedClient::default(), &request(false, false)).await;
    result.unwrap();

    let refine = &client.calls_with_system(REFINER_SYSTEM_PROMPT)[0];
    let prompt = refine.user_prompt();
    for (i, style) in [ACADEMIC, CREATIVE, TECHNICAL].iter().enumerate() {
        assert!(prompt.contains(&format!("--- ARTICLE {} ({}) ---", i + 1, style.label)));
        assert!(prompt.contains(&format!("--- CRITICISM OF ARTICLE {} ---", i + 1)));
    }
    assert!(prompt.contains("Do NOT include a references"));
}

#[tokio::test]
async fn critique_prompts_embed_draft_word_counts() {
    let (client, result, _) = run(ScriptedClient::default(), &request(false, false)).await;
    result.unwrap();

    let critiques = client.calls_with_system(CRITIC_SYSTEM_PROMPT);
    for style in STYLES {
        let draft = format!("{} draft with a handful of words in it", style.label);
        let expected = format!("WORD COUNT: {} words", word_count(&draft));
        assert!(
            critiques
                .iter()
                .any(|c| c.user_prompt().contains(&draft) && c.user_prompt().contains(&expected)),
            "no critique of {} with {expected}",
            style.label
        );
    }
}

#[tokio::test]
async fn web_search_enriches_every_draft_prompt() {
    let (client, result, events) = run(ScriptedClient::default(), &request(true, true)).await;
    result.unwrap();

    let calls = client.calls();
    assert_eq!(calls.len(), 8);
    assert_eq!(calls[0].system_prompt(), RESEARCH_SYSTEM_PROMPT);
    assert_eq!(calls[0].max_tokens, Some(1000));
    assert!(calls[0].user_prompt().contains("Research the latest information about: T."));

    for style in STYLES {
        let draft = &client.calls_with_system(style.system_prompt)[0];
        assert!(draft.user_prompt().contains(WEB_SEARCH_MARKER));
        assert!(draft.user_prompt().contains("https://example.com/research"));
    }

    let refine = &client.calls_with_system(REFINER_SYSTEM_PROMPT)[0];
    assert!(refine.user_prompt().contains("- Example Research - https://example.com/research"));
    assert!(
        refine
            .user_prompt()
            .contains("- T (Channel: Channel) - https://www.youtube.com/watch?v=dQw4w9WgXcQ")
    );

    let tracker = track(&events);
    assert_eq!(tracker.status(Stage::WebSearch), Some(ProgressStatus::Complete));
    assert_eq!(token_costs(&events).len(), 8);
}

#[tokio::test]
async fn web_search_failure_does_not_abort_generation() {
    let client = ScriptedClient::failing_on(RESEARCH_SYSTEM_PROMPT);
    let (client, result, events) = run(client, &request(true, false)).await;

    assert!(!result.unwrap().is_empty());
    for style in STYLES {
        let draft = &client.calls_with_system(style.system_prompt)[0];
        assert!(!draft.user_prompt().contains(WEB_SEARCH_MARKER));
    }
    assert_eq!(client.calls_with_system(REFINER_SYSTEM_PROMPT).len(), 1);

    let tracker = track(&events);
    assert_eq!(
        tracker.history(Stage::WebSearch),
        &[
            ProgressStatus::Pending,
            ProgressStatus::InProgress,
            ProgressStatus::Error
        ]
    );
    assert_eq!(tracker.status(Stage::FinalGeneration), Some(ProgressStatus::Complete));
}

#[tokio::test]
async fn failed_draft_skips_refinement() {
    let client = ScriptedClient::failing_on(CREATIVE.system_prompt);
    let (client, result, events) = run(client, &request(false, false)).await;

    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "Failed to generate article");
    assert!(client.calls_with_system(REFINER_SYSTEM_PROMPT).is_empty());

    let tracker = track(&events);
    assert_eq!(tracker.status(Stage::GenerationCreative), Some(ProgressStatus::Error));
    assert_eq!(tracker.status(Stage::FinalGeneration), Some(ProgressStatus::Pending));
}

#[tokio::test]
async fn failed_critique_skips_refinement() {
    let client = ScriptedClient::failing_on(CRITIC_SYSTEM_PROMPT);
    let (client, result, _) = run(client, &request(false, false)).await;

    assert!(matches!(result, Err(Yt2BlogError::Upstream { action: "generate criticism", .. })));
    assert!(client.calls_with_system(REFINER_SYSTEM_PROMPT).is_empty());
}

#[tokio::test]
async fn first_failure_cancels_sibling_branches() {
    let client = ScriptedClient {
        fail_system: Some(TECHNICAL.system_prompt),
        hang_system: vec![ACADEMIC.system_prompt, CREATIVE.system_prompt],
        ..ScriptedClient::default()
    };
    let (client, result, events) = run(client, &request(false, false)).await;

    assert!(result.is_err());
    assert!(client.calls_with_system(CRITIC_SYSTEM_PROMPT).is_empty());
    assert!(client.calls_with_system(REFINER_SYSTEM_PROMPT).is_empty());

    let tracker = track(&events);
    assert_eq!(tracker.status(Stage::GenerationTechnical), Some(ProgressStatus::Error));
    assert_eq!(tracker.status(Stage::GenerationAcademic), Some(ProgressStatus::InProgress));
    assert_eq!(tracker.status(Stage::GenerationCreative), Some(ProgressStatus::InProgress));
}

#[tokio::test]
async fn failed_refinement_is_fatal() {
    let client = ScriptedClient::failing_on(REFINER_SYSTEM_PROMPT);
    let (client, result, events) = run(client, &request(false, false)).await;

    assert!(matches!(
        result,
        Err(Yt2BlogError::Upstream { action: "generate refined article", .. })
    ));
    assert_eq!(client.calls().len(), 7);
    assert_eq!(track(&events).status(Stage::FinalGeneration), Some(ProgressStatus::Error));
}

#[tokio::test]
async fn invalid_request_makes_no_calls() {
    let mut req = request(true, false);
    req.instruction.clear();
    let (client, result, events) = run(ScriptedClient::default(), &req).await;

    assert!(matches!(result, Err(Yt2BlogError::Validation(_))));
    assert!(client.calls().is_empty());
    assert!(events.is_empty());
}

#[tokio::test]
async fn feedback_is_passed_to_every_draft() {
    let mut req = request(false, false);
    req.feedback = Some("Use more concrete examples".to_string());
    let (client, result, _) = run(ScriptedClient::default(), &req).await;
    result.unwrap();

    for style in STYLES {
        let draft = &client.calls_with_system(style.system_prompt)[0];
        assert!(draft.user_prompt().contains("Use more concrete examples"));
    }
}
