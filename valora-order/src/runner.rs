use std::ops::Range;
use std::time::Duration;
use tracing::info;
use valora_catalog::RecordValuer;

use crate::finance::Accumulator;
use crate::throughput::{self, RunResult};

/// Largest record count whose indices and count all convert to `f64` exactly
pub const MAX_RECORD_COUNT: u64 = 1 << 53;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    #[error("Worker failure: {0}")]
    WorkerFailure(String),
}

pub type RunOutcome<T> = Result<T, RunError>;

pub(crate) fn validate_record_count(record_count: u64) -> RunOutcome<()> {
    if record_count < 1 {
        return Err(RunError::InvalidArgument(
            "record count must be at least 1".to_string(),
        ));
    }
    if record_count > MAX_RECORD_COUNT {
        return Err(RunError::ArithmeticOverflow(format!(
            "record count {} exceeds the supported maximum of {}",
            record_count, MAX_RECORD_COUNT
        )));
    }
    Ok(())
}

/// Convert a caller-supplied signed count, rejecting zero and negatives
pub fn checked_record_count(requested: i64) -> RunOutcome<u64> {
    let record_count = u64::try_from(requested).map_err(|_| {
        RunError::InvalidArgument(format!("record count must be at least 1 (got {})", requested))
    })?;
    validate_record_count(record_count)?;
    Ok(record_count)
}

/// Progress snapshot handed to checkpoint observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub processed: u64,
    pub elapsed: Duration,
}

/// Value `indices` in ascending order into `acc`
#[inline]
pub fn accumulate_range<V>(valuer: &V, indices: Range<u64>, acc: &mut Accumulator)
where
    V: RecordValuer + ?Sized,
{
    for index in indices {
        acc.add(&valuer.value(index));
    }
}

/// Single-threaded reference run over `1..=record_count`
pub struct SerialRunner<'a, V: ?Sized> {
    valuer: &'a V,
    checkpoint_interval: u64,
}

impl<'a, V> SerialRunner<'a, V>
where
    V: RecordValuer + ?Sized,
{
    pub fn new(valuer: &'a V) -> Self {
        Self {
            valuer,
            checkpoint_interval: 0,
        }
    }

    /// Report progress every `interval` records (0 disables checkpoints)
    pub fn with_checkpoint_interval(mut self, interval: u64) -> Self {
        self.checkpoint_interval = interval;
        self
    }

    pub fn run(&self, record_count: u64) -> RunOutcome<RunResult> {
        self.run_observed(record_count, |_| {})
    }

    /// Run, calling `on_checkpoint` each time the processed count reaches a
    /// multiple of the checkpoint interval.
    ///
    /// The observer runs on the kernel thread between chunks and only sees the
    /// [`Checkpoint`]; it should hand the value off and return quickly.
    pub fn run_observed<F>(&self, record_count: u64, mut on_checkpoint: F) -> RunOutcome<RunResult>
    where
        F: FnMut(Checkpoint),
    {
        validate_record_count(record_count)?;
        info!(record_count, checkpoint_interval = self.checkpoint_interval, "Starting serial run");

        let result = throughput::measure(record_count, None, |clock| {
            let mut totals = Accumulator::new();
            let end = record_count + 1;

            if self.checkpoint_interval == 0 {
                accumulate_range(self.valuer, 1..end, &mut totals);
                return Ok(totals);
            }

            let mut next = 1;
            while next < end {
                let chunk_end = next.saturating_add(self.checkpoint_interval).min(end);
                accumulate_range(self.valuer, next..chunk_end, &mut totals);

                let processed = chunk_end - 1;
                if processed % self.checkpoint_interval == 0 {
                    on_checkpoint(Checkpoint {
                        processed,
                        elapsed: clock.elapsed(),
                    });
                }
                next = chunk_end;
            }
            Ok(totals)
        })?;

        info!(
            record_count,
            execution_time = result.execution_time(),
            ops_per_sec = result.ops_per_sec(),
            "Serial run finished"
        );
        Ok(result)
    }
}
