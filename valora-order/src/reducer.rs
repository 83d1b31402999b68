//! Fork-join reduction over contiguous index partitions
//!
//! `[1, N]` is cut into `W` contiguous blocks whose sizes differ by at most one
//! (the first `N % W` blocks take the extra record). Each block is valued into
//! its own [`Accumulator`] on a dedicated pool of `W` threads; nothing is shared
//! until every block is done. Partials are then folded in ascending partition
//! index, so a given `(N, W)` always produces bit-identical totals.
//!
//! When `W > N` only `N` one-record blocks (and threads) are created; the run
//! still reports `W` as the cores used.

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::any::Any;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, info};
use valora_catalog::RecordValuer;

use crate::finance::Accumulator;
use crate::runner::{accumulate_range, validate_record_count, RunError, RunOutcome};
use crate::throughput::{self, RunResult};

/// Largest worker count a parallel run accepts
pub const MAX_WORKER_COUNT: usize = 4096;

/// Contiguous block of order indices `[first, end)` owned by one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub index: usize,
    pub first: u64,
    pub end: u64,
}

impl Partition {
    pub fn len(&self) -> u64 {
        self.end - self.first
    }

    pub fn is_empty(&self) -> bool {
        self.first == self.end
    }

    pub fn indices(&self) -> Range<u64> {
        self.first..self.end
    }
}

/// Split `[1, record_count]` into `worker_count` gap-free, non-overlapping blocks.
///
/// Blocks that would be empty are not produced, so the result holds
/// `min(worker_count, record_count)` blocks (at least one).
pub fn partition(record_count: u64, worker_count: usize) -> Vec<Partition> {
    let blocks = active_workers(record_count, worker_count);
    let workers = blocks as u64;
    let base = record_count / workers;
    let remainder = record_count % workers;

    let mut first = 1;
    (0..blocks)
        .map(|index| {
            let len = base + u64::from((index as u64) < remainder);
            let block = Partition {
                index,
                first,
                end: first + len,
            };
            first += len;
            block
        })
        .collect()
}

/// Workers that get at least one record
fn active_workers(record_count: u64, worker_count: usize) -> usize {
    let capped = usize::try_from(record_count).unwrap_or(usize::MAX);
    worker_count.min(capped).max(1)
}

/// Hardware threads available to this process
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Parallel counterpart of [`crate::SerialRunner`]
pub struct ParallelReducer<'a, V: ?Sized> {
    valuer: &'a V,
}

impl<'a, V> ParallelReducer<'a, V>
where
    V: RecordValuer + ?Sized,
{
    pub fn new(valuer: &'a V) -> Self {
        Self { valuer }
    }

    /// Value `1..=record_count` on `worker_count` threads (`None` = one per
    /// hardware thread).
    ///
    /// Any worker failure fails the whole run; no partial totals are returned.
    pub fn run(&self, record_count: u64, worker_count: Option<usize>) -> RunOutcome<RunResult> {
        validate_record_count(record_count)?;
        let worker_count =
            worker_count.unwrap_or_else(|| default_worker_count().min(MAX_WORKER_COUNT));
        if worker_count < 1 {
            return Err(RunError::InvalidArgument(
                "worker count must be at least 1".to_string(),
            ));
        }
        if worker_count > MAX_WORKER_COUNT {
            return Err(RunError::InvalidArgument(format!(
                "worker count {} exceeds the supported maximum of {}",
                worker_count, MAX_WORKER_COUNT
            )));
        }

        let partitions = partition(record_count, worker_count);
        let pool = ThreadPoolBuilder::new()
            .num_threads(partitions.len())
            .thread_name(|i| format!("valora-worker-{}", i))
            .build()
            .map_err(|e| RunError::WorkerFailure(format!("Failed to build worker pool: {}", e)))?;

        info!(record_count, worker_count, "Starting parallel run");

        let result = throughput::measure(record_count, Some(worker_count), |_| {
            let partials: Vec<RunOutcome<Accumulator>> = pool.install(|| {
                partitions
                    .par_iter()
                    .map(|block| self.run_partition(block))
                    .collect()
            });
            debug!(partitions = partials.len(), "Merging partial totals");
            merge_partials(partials)
        });

        match &result {
            Ok(run) => info!(
                record_count,
                worker_count,
                execution_time = run.execution_time(),
                ops_per_sec = run.ops_per_sec(),
                "Parallel run finished"
            ),
            Err(e) => error!(record_count, worker_count, "Parallel run failed: {}", e),
        }
        result
    }

    fn run_partition(&self, block: &Partition) -> RunOutcome<Accumulator> {
        debug!(
            partition = block.index,
            first = block.first,
            len = block.len(),
            "Valuing partition"
        );

        panic::catch_unwind(AssertUnwindSafe(|| {
            let mut acc = Accumulator::new();
            accumulate_range(self.valuer, block.indices(), &mut acc);
            acc
        }))
        .map_err(|payload| {
            RunError::WorkerFailure(format!(
                "partition {} aborted: {}",
                block.index,
                panic_message(&*payload)
            ))
        })
    }
}

/// Fold partial sums in the order given, stopping at the first failure
pub fn merge_partials<I>(partials: I) -> RunOutcome<Accumulator>
where
    I: IntoIterator<Item = RunOutcome<Accumulator>>,
{
    partials
        .into_iter()
        .try_fold(Accumulator::new(), |totals, partial| Ok(totals.merged(&partial?)))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
