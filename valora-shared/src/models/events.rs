use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which kernel produced a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunMode {
    Serial,
    Parallel,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Serial => "serial",
            RunMode::Parallel => "parallel",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RunProgressEvent {
    pub run_id: Uuid,
    pub processed: u64,
    pub elapsed_secs: f64,
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RunCompletedEvent {
    pub run_id: Uuid,
    pub mode: RunMode,
    pub record_count: u64,
    pub execution_time: f64,
    pub ops_per_sec: f64,
    pub total_final: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cores_used: Option<usize>,
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RunFailedEvent {
    pub run_id: Uuid,
    pub mode: RunMode,
    pub reason: String,
    pub timestamp: i64,
}

/// Everything published on the run event channel
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    Progress(RunProgressEvent),
    Completed(RunCompletedEvent),
    Failed(RunFailedEvent),
}

impl RunEvent {
    /// SSE event name
    pub fn kind(&self) -> &'static str {
        match self {
            RunEvent::Progress(_) => "progress",
            RunEvent::Completed(_) => "completed",
            RunEvent::Failed(_) => "failed",
        }
    }

    pub fn run_id(&self) -> Uuid {
        match self {
            RunEvent::Progress(e) => e.run_id,
            RunEvent::Completed(e) => e.run_id,
            RunEvent::Failed(e) => e.run_id,
        }
    }
}
