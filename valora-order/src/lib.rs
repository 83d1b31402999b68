pub mod finance;
pub mod runner;
pub mod reducer;
pub mod throughput;

pub use finance::Accumulator;
pub use reducer::{default_worker_count, partition, ParallelReducer, Partition, MAX_WORKER_COUNT};
pub use runner::{
    checked_record_count, Checkpoint, RunError, RunOutcome, SerialRunner, MAX_RECORD_COUNT,
};
pub use throughput::{RunResult, RunSummary, Stopwatch};

use valora_catalog::PricingEngine;

/// Value orders `1..=record_count` on the calling thread with the reference rules
pub fn run_serial(record_count: u64) -> RunOutcome<RunResult> {
    let engine = PricingEngine::default();
    SerialRunner::new(&engine).run(record_count)
}

/// Value orders `1..=record_count` across `worker_count` threads (default: one
/// per hardware thread) with the reference rules
pub fn run_parallel(record_count: u64, worker_count: Option<usize>) -> RunOutcome<RunResult> {
    let engine = PricingEngine::default();
    ParallelReducer::new(&engine).run(record_count, worker_count)
}
