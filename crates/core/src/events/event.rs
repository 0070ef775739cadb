use tokio::time::Instant;
use uuid::Uuid;

use crate::{
    progress::{ProgressStatus, Stage},
    types::TokenCost,
};

/// Notifications published by the pipeline while a request is running.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Progress { stage: Stage, status: ProgressStatus },
    TokenUsage(TokenCost),
}

impl PipelineEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            PipelineEvent::Progress { .. } => "stage.progress",
            PipelineEvent::TokenUsage(_) => "token.usage",
        }
    }
}

/// A published event stamped with the run it belongs to and its ingest order.
#[derive(Debug, Clone)]
pub struct EnrichedEvent {
    pub event: PipelineEvent,
    pub session_id: Uuid,
    pub ingest_seq: u64,
    pub ingested_at: Instant,
}
