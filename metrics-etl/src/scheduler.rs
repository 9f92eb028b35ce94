use chrono::{DateTime, Days, Local, TimeDelta, TimeZone};
use metrics_config::ExecutionTime;
use std::time::Duration;
use tracing::info;

use crate::error::TransferResult;
use crate::pipeline::TransferPipeline;
use crate::shutdown::ShutdownRx;

/// The outer control loop: sleep until the configured time of day, run one
/// pipeline pass, repeat.
///
/// The due time is recomputed from the wall clock on every iteration, so
/// system clock adjustments are absorbed on the next loop instead of being
/// corrected mid-sleep. There is no catch-up: a due time that passes while
/// the process is down is skipped, not queued.
#[derive(Debug)]
pub struct DailyScheduler {
    execution_time: ExecutionTime,
    shutdown_rx: ShutdownRx,
}

impl DailyScheduler {
    /// Creates a scheduler firing daily at `execution_time`.
    pub fn new(execution_time: ExecutionTime, shutdown_rx: ShutdownRx) -> Self {
        Self {
            execution_time,
            shutdown_rx,
        }
    }

    /// Runs forever, alternating between waiting for the due time and
    /// executing one pipeline run.
    ///
    /// Returns `Ok(())` only when shutdown is signaled during the wait.
    /// Pipeline connection failures propagate out and terminate the loop;
    /// per-metric failures are already absorbed inside the run.
    pub async fn run(mut self, pipeline: &TransferPipeline) -> TransferResult<()> {
        loop {
            let now = Local::now();
            let due = next_due_time(&now, self.execution_time);
            info!(due = %due, "waiting until next scheduled transfer");

            let wait = (due - now).to_std().unwrap_or(Duration::ZERO);
            tokio::select! {
                _ = self.shutdown_rx.changed() => {
                    info!("shutdown signaled, stopping the scheduler");
                    return Ok(());
                }
                _ = tokio::time::sleep(wait) => {}
            }

            pipeline.run().await?;
        }
    }
}

/// Computes the next instant at which a run is due.
///
/// Today at the configured time if that is still in the future, otherwise
/// the same time one calendar day later. The result is never in the past at
/// the moment of computation.
pub fn next_due_time<Tz: TimeZone>(now: &DateTime<Tz>, at: ExecutionTime) -> DateTime<Tz> {
    for days_ahead in 0..=1 {
        let date = now.date_naive() + Days::new(days_ahead);
        let candidate = date.and_time(at.as_time());

        // `earliest` resolves DST ambiguity and skips nonexistent local
        // times (the candidate then moves to the next day).
        if let Some(candidate) = candidate.and_local_timezone(now.timezone()).earliest()
            && candidate > *now
        {
            return candidate;
        }
    }

    // Unreachable for a valid ExecutionTime; fall back to a full day out.
    now.clone() + TimeDelta::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn at(hour: u8, minute: u8) -> ExecutionTime {
        ExecutionTime::new(hour, minute).unwrap()
    }

    fn instant(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_due_today_when_time_still_ahead() {
        let now = instant(22, 0);
        let due = next_due_time(&now, at(23, 0));

        assert_eq!(due, instant(23, 0));
    }

    #[test]
    fn test_due_tomorrow_when_time_already_passed() {
        let now = instant(23, 30);
        let due = next_due_time(&now, at(23, 0));

        assert_eq!(due, Utc.with_ymd_and_hms(2024, 3, 2, 23, 0, 0).unwrap());
    }

    #[test]
    fn test_due_tomorrow_when_exactly_at_execution_time() {
        // A due time equal to `now` has already fired; the next one is a
        // day out.
        let now = instant(23, 0);
        let due = next_due_time(&now, at(23, 0));

        assert_eq!(due, Utc.with_ymd_and_hms(2024, 3, 2, 23, 0, 0).unwrap());
    }

    #[test]
    fn test_due_time_is_never_in_the_past() {
        for hour in 0..24u8 {
            for minute in [0u8, 15, 59] {
                let now = instant(12, 30);
                let due = next_due_time(&now, at(hour, minute));

                assert!(due > now, "due {due} not after now {now}");
                assert!(due - now <= TimeDelta::days(1));
            }
        }
    }

    #[test]
    fn test_due_date_rolls_over_month_boundaries() {
        let now = Utc.with_ymd_and_hms(2024, 2, 29, 23, 30, 0).unwrap();
        let due = next_due_time(&now, at(23, 0));

        assert_eq!(due, Utc.with_ymd_and_hms(2024, 3, 1, 23, 0, 0).unwrap());
    }
}
