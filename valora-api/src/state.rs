use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use valora_catalog::{PricingConfig, PricingEngine};
use valora_core::PersonRepository;
use valora_shared::{RunCompletedEvent, RunEvent};
use valora_store::RunConfig;

use crate::metrics::Metrics;

/// Completed runs kept for `GET /v1/runs`
pub const RUN_HISTORY_LIMIT: usize = 50;

const EVENT_CHANNEL_CAPACITY: usize = 100;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PricingEngine>,
    pub people: Arc<dyn PersonRepository>,
    pub runs: RunConfig,
    pub run_tx: broadcast::Sender<RunEvent>,
    pub history: Arc<RwLock<VecDeque<RunCompletedEvent>>>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        pricing: PricingConfig,
        people: Arc<dyn PersonRepository>,
        runs: RunConfig,
    ) -> anyhow::Result<Self> {
        pricing.validate()?;
        let (run_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            engine: Arc::new(PricingEngine::new(pricing)),
            people,
            runs,
            run_tx,
            history: Arc::new(RwLock::new(VecDeque::with_capacity(RUN_HISTORY_LIMIT))),
            metrics: Arc::new(Metrics::new()?),
        })
    }

    pub async fn record_run(&self, run: RunCompletedEvent) {
        let mut history = self.history.write().await;
        history.push_front(run);
        history.truncate(RUN_HISTORY_LIMIT);
    }

    /// Newest first
    pub async fn recent_runs(&self) -> Vec<RunCompletedEvent> {
        self.history.read().await.iter().cloned().collect()
    }
}
