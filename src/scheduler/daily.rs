use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::Instant;

use crate::report::ReportRunner;
use crate::scheduler::wait_or_shutdown;

const DEFAULT_STARTUP_DELAY: Duration = Duration::from_secs(30);
const DAILY_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Time remaining until the next 00:00:00 UTC boundary. At exactly
/// midnight this is a full day, matching a tick that has just fired.
pub fn until_next_utc_midnight(now: DateTime<Utc>) -> Duration {
    let next = (now + chrono::Duration::days(1))
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time")
        .and_utc();
    (next - now).to_std().unwrap_or(Duration::ZERO)
}

/// Background loop delivering the daily report.
///
/// Runs once shortly after startup as an unaligned smoke run, then waits
/// for the next UTC midnight and settles into a drift-free 24h loop: tick
/// `k` fires at `midnight + k*period` no matter how long earlier
/// executions took.
pub struct ReportScheduler {
    job: Arc<dyn ReportRunner>,
    startup_delay: Duration,
    period: Duration,
}

impl ReportScheduler {
    pub fn new(job: Arc<dyn ReportRunner>) -> Self {
        Self::with_timing(job, DEFAULT_STARTUP_DELAY, DAILY_PERIOD)
    }

    pub fn with_timing(job: Arc<dyn ReportRunner>, startup_delay: Duration, period: Duration) -> Self {
        Self {
            job,
            startup_delay,
            period,
        }
    }

    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            startup_delay_secs = self.startup_delay.as_secs(),
            "report scheduler started"
        );

        if wait_or_shutdown(self.startup_delay, &mut shutdown).await {
            return;
        }
        if self.run_once_guarded(&mut shutdown).await {
            return;
        }

        let to_midnight = until_next_utc_midnight(Utc::now());
        tracing::info!(
            secs_to_midnight = to_midnight.as_secs(),
            "waiting for next UTC midnight"
        );
        if wait_or_shutdown(to_midnight, &mut shutdown).await {
            return;
        }

        self.run_periodic(shutdown).await;
        tracing::info!("report scheduler stopped");
    }

    /// Fixed-period loop anchored at its entry instant. `interval_at`
    /// schedules every tick from that origin, so a slow execution delays
    /// nothing but itself.
    pub async fn run_periodic(&self, mut shutdown: watch::Receiver<bool>) {
        let start = Instant::now();
        let mut ticker = tokio::time::interval_at(start + self.period, self.period);

        // The tick that brought us here (startup or midnight) runs first.
        if self.run_once_guarded(&mut shutdown).await {
            return;
        }

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.wait_for(|stop| *stop) => return,
            }
            if self.run_once_guarded(&mut shutdown).await {
                return;
            }
        }
    }

    /// Returns true when shutdown interrupted the execution.
    async fn run_once_guarded(&self, shutdown: &mut watch::Receiver<bool>) -> bool {
        let outcome = tokio::select! {
            result = self.job.run_once() => Some(result),
            _ = shutdown.wait_for(|stop| *stop) => None,
        };

        match outcome {
            None => true,
            Some(Ok(outcome)) => {
                tracing::info!(count = outcome.count, "report run complete");
                false
            }
            Some(Err(e)) => {
                tracing::error!(error = %e, "report run failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::TimeZone;

    use crate::app::{MemeflowError, Result};
    use crate::domain::ReportOutcome;

    struct RecordingRunner {
        starts: Mutex<Vec<Instant>>,
        busy: Duration,
        fail: bool,
    }

    impl RecordingRunner {
        fn new(busy: Duration, fail: bool) -> Self {
            Self {
                starts: Mutex::new(Vec::new()),
                busy,
                fail,
            }
        }
    }

    #[async_trait]
    impl ReportRunner for RecordingRunner {
        async fn run_once(&self) -> Result<ReportOutcome> {
            self.starts.lock().unwrap().push(Instant::now());
            if !self.busy.is_zero() {
                tokio::time::sleep(self.busy).await;
            }
            if self.fail {
                return Err(MemeflowError::Other("boom".into()));
            }
            Ok(ReportOutcome {
                count: 0,
                document: Vec::new(),
            })
        }
    }

    #[test]
    fn test_until_next_utc_midnight() {
        let now = Utc.with_ymd_and_hms(2026, 8, 25, 15, 30, 0).unwrap();
        assert_eq!(
            until_next_utc_midnight(now),
            Duration::from_secs(8 * 3600 + 30 * 60)
        );

        let midnight = Utc.with_ymd_and_hms(2026, 8, 26, 0, 0, 0).unwrap();
        assert_eq!(until_next_utc_midnight(midnight), Duration::from_secs(86400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_loop_is_drift_free() {
        // Execution takes 95ms of a 100ms period; run k must still start at
        // origin + k*period, not at end-of-previous + period.
        let runner = Arc::new(RecordingRunner::new(Duration::from_millis(95), false));
        let scheduler = ReportScheduler::with_timing(
            runner.clone(),
            Duration::ZERO,
            Duration::from_millis(100),
        );

        let (tx, rx) = watch::channel(false);
        let origin = Instant::now();
        let handle = tokio::spawn(async move { scheduler.run_periodic(rx).await });

        tokio::time::sleep(Duration::from_millis(350)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        let starts = runner.starts.lock().unwrap();
        assert_eq!(starts.len(), 4);
        for (k, start) in starts.iter().enumerate() {
            let offset = start.duration_since(origin);
            assert_eq!(offset.as_millis(), (100 * k) as u128);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_run_does_not_stop_the_loop() {
        let runner = Arc::new(RecordingRunner::new(Duration::ZERO, true));
        let scheduler = ReportScheduler::with_timing(
            runner.clone(),
            Duration::ZERO,
            Duration::from_millis(100),
        );

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { scheduler.run_periodic(rx).await });

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(!handle.is_finished());

        tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(runner.starts.lock().unwrap().len() >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_smoke_run_fires_shortly_after_startup() {
        let runner = Arc::new(RecordingRunner::new(Duration::ZERO, false));
        let counted = runner.clone();
        let scheduler = ReportScheduler::with_timing(
            runner,
            Duration::from_millis(10),
            Duration::from_secs(86400),
        );

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { scheduler.run(rx).await });

        // Past the startup delay but nowhere near midnight.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counted.starts.lock().unwrap().len(), 1);

        tx.send(true).unwrap();
        handle.await.unwrap();
        assert_eq!(counted.starts.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_aborts_in_flight_execution() {
        let runner = Arc::new(RecordingRunner::new(Duration::from_secs(3600), false));
        let counted = runner.clone();
        let scheduler =
            ReportScheduler::with_timing(runner, Duration::ZERO, Duration::from_secs(86400));

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { scheduler.run_periodic(rx).await });

        // The first execution is still busy when shutdown arrives; the
        // scheduler must return promptly instead of waiting it out.
        tokio::time::sleep(Duration::from_millis(10)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(counted.starts.lock().unwrap().len(), 1);
    }
}
