//! Daily scheduling of pipeline runs.
//!
//! The scheduler runs the job once at startup, then polls the clock every
//! `poll_interval` and runs the job again whenever the daily fire time has
//! passed. Runs never overlap: each one is awaited before the next decision.
//!
//! A panic inside a run is caught and logged; the loop keeps going. The loop
//! only ends when the `shutdown` future resolves, and only between runs.

use crate::pipeline::{Pipeline, RunReport};
use crate::{chat::ChatCompletion, linkedin::Publisher, news::ArticleSource};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Work the scheduler triggers.
pub trait ScheduledJob {
    async fn run(&self) -> RunReport;
}

impl<S, M, P> ScheduledJob for Pipeline<S, M, P>
where
    S: ArticleSource,
    M: ChatCompletion,
    P: Publisher,
{
    async fn run(&self) -> RunReport {
        Pipeline::run(self).await
    }
}

/// Source of "now" for fire-time decisions.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// First instant strictly after `now` at wall-clock time `at` (UTC).
pub fn next_fire_time(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Move `fire` forward a day at a time until it lies after `now`.
pub fn advance(mut fire: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    while fire <= now {
        fire += Duration::days(1);
    }
    fire
}

pub struct Scheduler {
    fire_at: NaiveTime,
    poll_interval: StdDuration,
    clock: Clock,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("fire_at", &self.fire_at)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl Scheduler {
    pub fn new(fire_at: NaiveTime, poll_interval: StdDuration) -> Self {
        Self {
            fire_at,
            poll_interval,
            clock: Arc::new(Utc::now),
        }
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Run `job` now and then daily until `shutdown` resolves.
    ///
    /// Returns the number of runs that were started.
    #[instrument(level = "info", skip_all, fields(fire_at = %self.fire_at))]
    pub async fn run<J, F>(&self, job: &J, shutdown: F) -> usize
    where
        J: ScheduledJob,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut runs = 0usize;

        self.run_guarded(job, &mut runs).await;
        let mut next = next_fire_time((self.clock)(), self.fire_at);
        info!(next_fire = %next, poll_secs = self.poll_interval.as_secs(), "Scheduler started");

        loop {
            let now = (self.clock)();
            if now >= next {
                self.run_guarded(job, &mut runs).await;
                next = advance(next, (self.clock)());
                info!(next_fire = %next, "Next run scheduled");
            }

            tokio::select! {
                _ = &mut shutdown => {
                    info!(runs, "Shutting down gracefully");
                    return runs;
                }
                _ = sleep(self.poll_interval) => {}
            }
        }
    }

    async fn run_guarded<J: ScheduledJob>(&self, job: &J, runs: &mut usize) {
        *runs += 1;
        match AssertUnwindSafe(job.run()).catch_unwind().await {
            Ok(report) if report.is_success() => info!(run = *runs, outcome = %report, "Run finished"),
            Ok(report) => warn!(run = *runs, outcome = %report, "Run finished with failures"),
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(run = *runs, %reason, "Error in scheduler loop; continuing");
            }
        }
    }
}
