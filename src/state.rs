use std::sync::Arc;

use tokio::sync::broadcast;

use crate::engine::go_home::{RandomScore, ScoreStrategy};
use crate::engine::ledger::IncentiveLedger;
use crate::models::event::LedgerEvent;
use crate::observability::metrics::Metrics;
use crate::store::memory::InMemoryStore;

pub struct AppState {
    pub store: Arc<InMemoryStore>,
    pub ledger: IncentiveLedger,
    pub ledger_events_tx: broadcast::Sender<LedgerEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(event_buffer_size: usize, recommendation_sample_size: usize) -> Self {
        Self::with_scorer(
            Arc::new(RandomScore),
            event_buffer_size,
            recommendation_sample_size,
        )
    }

    pub fn with_scorer(
        scorer: Arc<dyn ScoreStrategy>,
        event_buffer_size: usize,
        recommendation_sample_size: usize,
    ) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let ledger = IncentiveLedger::new(store.clone(), scorer, recommendation_sample_size);
        let (ledger_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            store,
            ledger,
            ledger_events_tx,
            metrics: Metrics::new(),
        }
    }

    /// Fans an event out to websocket subscribers. Dropped when nobody listens.
    pub fn publish(&self, event: LedgerEvent) {
        let _ = self.ledger_events_tx.send(event);
    }
}
