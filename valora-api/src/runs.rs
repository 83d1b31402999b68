use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::time::{Duration, Instant};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};
use uuid::Uuid;
use valora_order::{
    checked_record_count, ParallelReducer, RunOutcome, RunResult, RunSummary, SerialRunner,
};
use valora_shared::{RunCompletedEvent, RunEvent, RunFailedEvent, RunMode, RunProgressEvent};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/runs", get(list_runs))
        .route("/v1/runs/serial", post(run_serial))
        .route("/v1/runs/parallel", post(run_parallel))
        .route("/v1/runs/events", get(run_events))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Omitted fields fall back to the `[runs]` config section
#[derive(Debug, Default, Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub record_count: Option<i64>,
    #[serde(default)]
    pub worker_count: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub run_id: Uuid,
    pub mode: RunMode,
    pub record_count: u64,
    #[serde(flatten)]
    pub summary: RunSummary,
    /// Wall time of the whole request, dispatch included
    pub total_time: f64,
    pub started_at: DateTime<Utc>,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn run_serial(
    State(state): State<AppState>,
    Json(req): Json<RunRequest>,
) -> Result<Json<RunResponse>, AppError> {
    let record_count = resolve_record_count(&state, req.record_count)?;
    let run_id = Uuid::new_v4();
    let engine = state.engine.clone();
    let tx = state.run_tx.clone();
    let interval = state.runs.checkpoint_interval;

    let dispatched = Instant::now();
    let outcome = tokio::task::spawn_blocking(move || {
        SerialRunner::new(engine.as_ref())
            .with_checkpoint_interval(interval)
            .run_observed(record_count, |checkpoint| {
                // Nobody listening is not an error
                let _ = tx.send(RunEvent::Progress(RunProgressEvent {
                    run_id,
                    processed: checkpoint.processed,
                    elapsed_secs: checkpoint.elapsed.as_secs_f64(),
                    timestamp: Utc::now().timestamp(),
                }));
            })
    })
    .await?;

    finish_run(&state, run_id, RunMode::Serial, outcome, dispatched.elapsed()).await
}

pub async fn run_parallel(
    State(state): State<AppState>,
    Json(req): Json<RunRequest>,
) -> Result<Json<RunResponse>, AppError> {
    let record_count = resolve_record_count(&state, req.record_count)?;
    let worker_count = match req.worker_count {
        Some(requested) if requested >= 1 => Some(usize::try_from(requested).map_err(|_| {
            AppError::ValidationError(format!("worker_count {} is too large", requested))
        })?),
        Some(requested) => {
            return Err(AppError::ValidationError(format!(
                "worker_count must be at least 1 (got {})",
                requested
            )))
        }
        None => state.runs.default_worker_count,
    };
    let run_id = Uuid::new_v4();
    let engine = state.engine.clone();

    let dispatched = Instant::now();
    let outcome = tokio::task::spawn_blocking(move || {
        ParallelReducer::new(engine.as_ref()).run(record_count, worker_count)
    })
    .await?;

    finish_run(&state, run_id, RunMode::Parallel, outcome, dispatched.elapsed()).await
}

pub async fn list_runs(State(state): State<AppState>) -> Json<Vec<RunCompletedEvent>> {
    Json(state.recent_runs().await)
}

/// Server-sent stream of every [`RunEvent`], named by its kind
pub async fn run_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.run_tx.subscribe()).filter_map(|message| async move {
        match message {
            Ok(event) => Event::default()
                .id(event.run_id().to_string())
                .event(event.kind())
                .json_data(&event)
                .ok()
                .map(Ok),
            // Lagged subscribers just miss the dropped events
            Err(_) => None,
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

// ============================================================================
// Helpers
// ============================================================================

fn resolve_record_count(state: &AppState, requested: Option<i64>) -> Result<u64, AppError> {
    let record_count = match requested {
        Some(n) => checked_record_count(n)?,
        None => state.runs.default_record_count,
    };

    if record_count > state.runs.max_record_count {
        return Err(AppError::ValidationError(format!(
            "record_count {} exceeds the configured maximum of {}",
            record_count, state.runs.max_record_count
        )));
    }
    Ok(record_count)
}

async fn finish_run(
    state: &AppState,
    run_id: Uuid,
    mode: RunMode,
    outcome: RunOutcome<RunResult>,
    total: Duration,
) -> Result<Json<RunResponse>, AppError> {
    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            warn!(%run_id, mode = mode.as_str(), "Run failed: {}", e);
            let _ = state.run_tx.send(RunEvent::Failed(RunFailedEvent {
                run_id,
                mode,
                reason: e.to_string(),
                timestamp: Utc::now().timestamp(),
            }));
            return Err(e.into());
        }
    };

    let summary = result.summary();
    state
        .metrics
        .observe_run(mode, result.record_count, summary.execution_time);

    let completed = RunCompletedEvent {
        run_id,
        mode,
        record_count: result.record_count,
        execution_time: summary.execution_time,
        ops_per_sec: summary.ops_per_sec,
        total_final: summary.total_final,
        cores_used: summary.cores_used,
        timestamp: Utc::now().timestamp(),
    };
    state.record_run(completed.clone()).await;
    let _ = state.run_tx.send(RunEvent::Completed(completed));

    info!(
        %run_id,
        mode = mode.as_str(),
        record_count = result.record_count,
        execution_time = summary.execution_time,
        total_time = total.as_secs_f64(),
        "Run completed"
    );

    Ok(Json(RunResponse {
        run_id,
        mode,
        record_count: result.record_count,
        summary,
        total_time: total.as_secs_f64(),
        started_at: result.started_at,
    }))
}
