//! Generate, critique and refine orchestration.

use std::sync::Arc;

use futures::try_join;
use tracing::{Instrument, info, info_span, warn};

use crate::{
    config::PipelineConfig,
    error::{Result, Yt2BlogError},
    events::EventBus,
    llm::{ChatClient, ChatRequest, HttpChatClient},
    progress::{ProgressStatus, Stage},
    prompt::{
        CRITIC_SYSTEM_PROMPT, REFINER_SYSTEM_PROMPT, base_prompt, critique_prompt,
        refinement_prompt, video_summaries,
    },
    styles::{STYLES, StyleConfig},
    types::{DraftResult, GenerationRequest, WebSearchResult},
    validation::validate_request,
    web_search::perform_web_search,
};

const CRITIC_TEMPERATURE: f32 = 0.4;
const REFINER_TEMPERATURE: f32 = 0.6;

/// Runs the article pipeline against one chat completion backend.
pub struct ArticlePipeline {
    client: Arc<dyn ChatClient>,
    config: PipelineConfig,
    bus: EventBus,
}

impl ArticlePipeline {
    pub fn new(client: Arc<dyn ChatClient>, config: PipelineConfig, bus: EventBus) -> Self {
        Self {
            client,
            config,
            bus,
        }
    }

    /// Pipeline over HTTP using the endpoint and timeout from `config`.
    pub fn from_config(config: PipelineConfig, bus: EventBus) -> Self {
        let client = HttpChatClient::new(config.api_url(), config.request_timeout());
        Self::new(Arc::new(client), config, bus)
    }

    pub fn client(&self) -> &dyn ChatClient {
        self.client.as_ref()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Produce one refined article for `request`.
    ///
    /// Web search failures are logged and skipped. Any other failure aborts the
    /// run; in-flight sibling branches are dropped and no refinement happens.
    pub async fn generate_article(&self, request: &GenerationRequest) -> Result<String> {
        validate_request(request)?;

        let span = info_span!(
            "generate_article",
            session = %self.bus.session_id(),
            videos = request.content.len(),
            search = request.search_internet,
            keep_branding = request.keep_branding,
        );

        async {
            self.reset_progress(request.search_internet);

            let web_search = if request.search_internet {
                self.enrich(request).await
            } else {
                None
            };

            let summaries = video_summaries(&request.content);
            let base = base_prompt(
                &summaries,
                web_search.as_ref(),
                &request.instruction,
                request.keep_branding,
                request.feedback.as_deref(),
            );

            info!("starting parallel article generation with 3 styles");
            let [academic, creative, technical] = &STYLES;
            let (academic, creative, technical) = try_join!(
                self.draft_and_critique(request, &base, academic),
                self.draft_and_critique(request, &base, creative),
                self.draft_and_critique(request, &base, technical),
            )?;
            let drafts = [academic, creative, technical];

            info!("all drafts critiqued, creating final refined version");
            self.refine(request, &drafts, &summaries, web_search.as_ref())
                .await
        }
        .instrument(span)
        .await
    }

    fn reset_progress(&self, search_internet: bool) {
        for stage in Stage::ALL {
            if stage != Stage::WebSearch || search_internet {
                self.bus.progress(stage, ProgressStatus::Pending);
            }
        }
    }

    async fn enrich(&self, request: &GenerationRequest) -> Option<WebSearchResult> {
        self.bus.progress(Stage::WebSearch, ProgressStatus::InProgress);

        let topic = request.content.topic();
        match perform_web_search(
            self.client.as_ref(),
            &request.api_key,
            &self.config,
            &topic,
            &self.bus,
        )
        .await
        {
            Ok(result) => {
                self.bus.progress(Stage::WebSearch, ProgressStatus::Complete);
                Some(result)
            }
            Err(e) => {
                warn!(error = %e, "web search failed, continuing without it");
                self.bus.progress(Stage::WebSearch, ProgressStatus::Error);
                None
            }
        }
    }

    async fn draft_and_critique(
        &self,
        request: &GenerationRequest,
        base_prompt: &str,
        style: &StyleConfig,
    ) -> Result<DraftResult> {
        let draft = ChatRequest::new(
            "generate article",
            self.config.model(),
            style.system_prompt,
            base_prompt,
            style.temperature,
        );
        let article = self
            .run_stage(
                style.progress_stage,
                &request.api_key,
                draft,
                &format!("{} draft", style.label),
            )
            .await?;

        let critique = ChatRequest::new(
            "generate criticism",
            self.config.model(),
            CRITIC_SYSTEM_PROMPT,
            critique_prompt(&article, &request.instruction, style.label),
            CRITIC_TEMPERATURE,
        );
        let criticism = self
            .run_stage(
                style.verification_stage,
                &request.api_key,
                critique,
                &format!("{} critique", style.label),
            )
            .await?;

        Ok(DraftResult {
            article,
            criticism,
            label: style.label.to_string(),
        })
    }

    async fn refine(
        &self,
        request: &GenerationRequest,
        drafts: &[DraftResult; 3],
        summaries: &str,
        web_search: Option<&WebSearchResult>,
    ) -> Result<String> {
        let refinement = ChatRequest::new(
            "generate refined article",
            self.config.model(),
            REFINER_SYSTEM_PROMPT,
            refinement_prompt(
                drafts,
                &request.instruction,
                summaries,
                &request.content,
                web_search,
                request.keep_branding,
            ),
            REFINER_TEMPERATURE,
        );

        self.run_stage_checked(
            Stage::FinalGeneration,
            &request.api_key,
            refinement,
            "Final refinement",
            |article| {
                if article.trim().is_empty() {
                    return Err(Yt2BlogError::MalformedResponse {
                        action: "generate refined article",
                        reason: "model returned an empty article".to_string(),
                    });
                }
                Ok(())
            },
        )
        .await
    }

    async fn run_stage(
        &self,
        stage: Stage,
        api_key: &str,
        request: ChatRequest,
        operation: &str,
    ) -> Result<String> {
        self.run_stage_checked(stage, api_key, request, operation, |_| Ok(()))
            .await
    }

    /// One LLM call wrapped in `in-progress -> complete | error` for `stage`.
    ///
    /// `check` runs on the returned text before the stage is marked complete.
    async fn run_stage_checked(
        &self,
        stage: Stage,
        api_key: &str,
        request: ChatRequest,
        operation: &str,
        check: impl FnOnce(&str) -> Result<()>,
    ) -> Result<String> {
        self.bus.progress(stage, ProgressStatus::InProgress);

        let result = self
            .client
            .complete(api_key, request)
            .await
            .and_then(|completion| {
                self.bus.token_usage(completion.token_cost(operation));
                check(&completion.content)?;
                Ok(completion.content)
            });

        match result {
            Ok(content) => {
                self.bus.progress(stage, ProgressStatus::Complete);
                Ok(content)
            }
            Err(e) => {
                warn!(stage = stage.key(), error = %e, "stage failed");
                self.bus.progress(stage, ProgressStatus::Error);
                Err(e)
            }
        }
    }
}
