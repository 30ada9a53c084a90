use std::time::Instant;

use prometheus::{Encoder, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub trips_processed_total: IntCounterVec,
    pub coins_awarded_total: IntCounter,
    pub penalty_coins_total: IntCounter,
    pub multiplier_activations_total: IntCounterVec,
    pub ledger_latency_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let trips_processed_total = IntCounterVec::new(
            Opts::new("trips_processed_total", "Trip processing attempts by outcome"),
            &["outcome"],
        )
        .expect("valid trips_processed_total metric");

        let coins_awarded_total = IntCounter::new(
            "coins_awarded_total",
            "Coins awarded for trips, including streak bonuses",
        )
        .expect("valid coins_awarded_total metric");

        let penalty_coins_total = IntCounter::new(
            "penalty_coins_total",
            "Coins deducted for cancellations",
        )
        .expect("valid penalty_coins_total metric");

        let multiplier_activations_total = IntCounterVec::new(
            Opts::new(
                "multiplier_activations_total",
                "Multiplier activation attempts by outcome",
            ),
            &["outcome"],
        )
        .expect("valid multiplier_activations_total metric");

        let ledger_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "ledger_latency_seconds",
                "Latency of ledger operations in seconds",
            ),
            &["operation", "outcome"],
        )
        .expect("valid ledger_latency_seconds metric");

        registry
            .register(Box::new(trips_processed_total.clone()))
            .expect("register trips_processed_total");
        registry
            .register(Box::new(coins_awarded_total.clone()))
            .expect("register coins_awarded_total");
        registry
            .register(Box::new(penalty_coins_total.clone()))
            .expect("register penalty_coins_total");
        registry
            .register(Box::new(multiplier_activations_total.clone()))
            .expect("register multiplier_activations_total");
        registry
            .register(Box::new(ledger_latency_seconds.clone()))
            .expect("register ledger_latency_seconds");

        Self {
            registry,
            trips_processed_total,
            coins_awarded_total,
            penalty_coins_total,
            multiplier_activations_total,
            ledger_latency_seconds,
        }
    }

    pub fn observe_latency(&self, operation: &str, started: Instant, success: bool) {
        let outcome = if success { "success" } else { "error" };
        self.ledger_latency_seconds
            .with_label_values(&[operation, outcome])
            .observe(started.elapsed().as_secs_f64());
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
