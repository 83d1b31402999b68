use axum::{extract::State, http::header, response::IntoResponse};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use valora_shared::RunMode;

use crate::error::AppError;
use crate::state::AppState;

/// Run counters exported on `/metrics`
pub struct Metrics {
    registry: Registry,
    runs_total: IntCounterVec,
    records_valued_total: IntCounter,
    run_duration_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let runs_total = IntCounterVec::new(
            Opts::new("valora_runs_total", "Completed valuation runs"),
            &["mode"],
        )?;
        let records_valued_total = IntCounter::new(
            "valora_records_valued_total",
            "Orders valued across all completed runs",
        )?;
        let run_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "valora_run_duration_seconds",
                "Kernel execution time of completed runs in seconds",
            )
            .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 180.0]),
            &["mode"],
        )?;

        registry.register(Box::new(runs_total.clone()))?;
        registry.register(Box::new(records_valued_total.clone()))?;
        registry.register(Box::new(run_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            runs_total,
            records_valued_total,
            run_duration_seconds,
        })
    }

    pub fn observe_run(&self, mode: RunMode, record_count: u64, execution_time: f64) {
        self.runs_total.with_label_values(&[mode.as_str()]).inc();
        self.records_valued_total.inc_by(record_count);
        self.run_duration_seconds
            .with_label_values(&[mode.as_str()])
            .observe(execution_time);
    }

    /// Prometheus text exposition of every registered metric
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state
        .metrics
        .render()
        .map_err(|e| AppError::InternalServerError(format!("Failed to encode metrics: {}", e)))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}
