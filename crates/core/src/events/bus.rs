use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::{sync::mpsc, time::Instant};
use uuid::Uuid;

use crate::{
    events::{EnrichedEvent, PipelineEvent},
    progress::{ProgressStatus, Stage},
    types::TokenCost,
};

pub type EventReceiver = mpsc::UnboundedReceiver<EnrichedEvent>;

/// Single-subscriber event stream shared by every concurrent pipeline branch.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<EventBusInner>,
}

struct EventBusInner {
    session_id: Uuid,
    next_ingest_seq: AtomicU64,
    tx: Option<mpsc::UnboundedSender<EnrichedEvent>>,
    drops_total: AtomicU64,
}

impl EventBus {
    /// Create a bus for a new session together with the receiving end.
    pub fn new() -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::with_sender(Some(tx)), rx)
    }

    /// A bus nobody listens to. Events are counted as dropped.
    pub fn detached() -> Self {
        Self::with_sender(None)
    }

    fn with_sender(tx: Option<mpsc::UnboundedSender<EnrichedEvent>>) -> Self {
        Self {
            inner: Arc::new(EventBusInner {
                session_id: Uuid::new_v4(),
                next_ingest_seq: AtomicU64::new(0),
                tx,
                drops_total: AtomicU64::new(0),
            }),
        }
    }

    pub fn publish(&self, event: PipelineEvent) {
        let ingest_seq = self.inner.next_ingest_seq.fetch_add(1, Ordering::Relaxed);

        let enriched = EnrichedEvent {
            event,
            session_id: self.inner.session_id,
            ingest_seq,
            ingested_at: Instant::now(),
        };

        let delivered = match &self.inner.tx {
            Some(tx) => tx.send(enriched).is_ok(),
            None => false,
        };

        if !delivered {
            self.inner.drops_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn progress(&self, stage: Stage, status: ProgressStatus) {
        tracing::debug!(stage = stage.key(), %status, "stage progress");
        self.publish(PipelineEvent::Progress { stage, status });
    }

    pub fn token_usage(&self, cost: TokenCost) {
        self.publish(PipelineEvent::TokenUsage(cost));
    }

    pub fn session_id(&self) -> Uuid {
        self.inner.session_id
    }

    pub fn drops_total(&self) -> u64 {
        self.inner.drops_total.load(Ordering::Relaxed)
    }
}
