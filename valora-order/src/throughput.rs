//! Throughput measurement
//!
//! Only the kernel closure handed to [`measure`] is timed. Validation, worker
//! pool construction and partitioning happen before the clock starts, and
//! anything the caller does with the result happens after it stops.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::finance::Accumulator;
use crate::runner::RunOutcome;

/// Monotonic wall-clock timer
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Outcome of one kernel run
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub totals: Accumulator,
    pub record_count: u64,
    pub elapsed: Duration,
    /// Worker threads used; `None` for serial runs
    pub cores_used: Option<usize>,
    pub started_at: DateTime<Utc>,
}

impl RunResult {
    /// Kernel time in seconds
    pub fn execution_time(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Records valued per second of kernel time. A run too short for the
    /// clock to register is treated as taking one nanosecond.
    pub fn ops_per_sec(&self) -> f64 {
        let secs = self.elapsed.max(Duration::from_nanos(1)).as_secs_f64();
        self.record_count as f64 / secs
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            execution_time: self.execution_time(),
            ops_per_sec: self.ops_per_sec(),
            total_value: self.totals.sum_value,
            total_taxes: self.totals.sum_taxes,
            total_freight: self.totals.sum_freight,
            total_discount: self.totals.sum_discount,
            total_final: self.totals.sum_total,
            cores_used: self.cores_used,
        }
    }
}

/// Flat view of a run handed to reporting layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub execution_time: f64,
    pub ops_per_sec: f64,
    pub total_value: f64,
    pub total_taxes: f64,
    pub total_freight: f64,
    pub total_discount: f64,
    pub total_final: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cores_used: Option<usize>,
}

/// Run `kernel` under a fresh [`Stopwatch`] and package its totals.
///
/// The kernel receives the stopwatch so it can stamp progress checkpoints with
/// the same clock that produces the final `elapsed`.
pub fn measure<F>(record_count: u64, cores_used: Option<usize>, kernel: F) -> RunOutcome<RunResult>
where
    F: FnOnce(&Stopwatch) -> RunOutcome<Accumulator>,
{
    let started_at = Utc::now();
    let clock = Stopwatch::start();
    let totals = kernel(&clock)?;
    let elapsed = clock.elapsed();

    Ok(RunResult {
        totals,
        record_count,
        elapsed,
        cores_used,
        started_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::RunError;

    #[test]
    fn test_measure_times_only_the_kernel() {
        let result = measure(1_000, Some(2), |_| {
            std::thread::sleep(Duration::from_millis(10));
            Ok(Accumulator::new())
        })
        .unwrap();

        assert!(result.elapsed >= Duration::from_millis(10));
        assert_eq!(result.record_count, 1_000);
        assert_eq!(result.cores_used, Some(2));
        assert!(result.ops_per_sec() > 0.0);
        assert!(result.ops_per_sec() <= 1_000.0 / 0.010);
    }

    #[test]
    fn test_measure_propagates_kernel_failure() {
        let outcome = measure(10, None, |_| {
            Err(RunError::WorkerFailure("boom".to_string()))
        });
        assert!(matches!(outcome, Err(RunError::WorkerFailure(_))));
    }

    #[test]
    fn test_zero_duration_does_not_divide_by_zero() {
        let result = RunResult {
            totals: Accumulator::new(),
            record_count: 5,
            elapsed: Duration::ZERO,
            cores_used: None,
            started_at: Utc::now(),
        };
        assert!(result.ops_per_sec().is_finite());
        assert_eq!(result.execution_time(), 0.0);
    }

    #[test]
    fn test_summary_fields() {
        let result = RunResult {
            totals: Accumulator {
                sum_value: 1.0,
                sum_taxes: 2.0,
                sum_freight: 3.0,
                sum_discount: 4.0,
                sum_total: 5.0,
            },
            record_count: 10,
            elapsed: Duration::from_secs(2),
            cores_used: None,
            started_at: Utc::now(),
        };

        let summary = result.summary();
        assert_eq!(summary.execution_time, 2.0);
        assert_eq!(summary.ops_per_sec, 5.0);
        assert_eq!(summary.total_value, 1.0);
        assert_eq!(summary.total_final, 5.0);
        assert_eq!(summary.cores_used, None);
    }
}
