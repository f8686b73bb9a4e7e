//! Polling scheduler for digest runs.
//!
//! The scheduler owns a list of `(trigger, job)` entries and is driven by a
//! single loop that wakes every `poll_interval`. Jobs run one at a time; a
//! trigger that falls due while another job is running fires once when the
//! loop next polls, and missed occurrences are not queued.

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveTime, TimeZone};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::runner::DigestRunner;

/// Default poll period of the control loop.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Lookback of every recurring digest job. Only the immediate test-mode run
/// uses a lookback of 0.
pub const SCHEDULED_LOOKBACK_DAYS: u32 = 1;

/// When an entry fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Every day at a local wall-clock time.
    DailyAt(NaiveTime),
    /// At a fixed period.
    Every(Duration),
}

impl Trigger {
    /// First firing time strictly after `after`.
    pub fn next_after<Tz: TimeZone>(&self, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        match self {
            Self::DailyAt(time) => {
                let tz = after.timezone();
                let mut day = after.date_naive();
                // Two days covers a wall-clock time skipped by a DST change.
                for _ in 0..3 {
                    if let Some(candidate) = tz.from_local_datetime(&day.and_time(*time)).earliest() {
                        if candidate > *after {
                            return Some(candidate);
                        }
                    }
                    day = day.succ_opt()?;
                }
                None
            }
            Self::Every(period) => {
                let period = chrono::Duration::from_std(*period).ok()?;
                after.clone().checked_add_signed(period)
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::DailyAt(time) => format!("daily at {}", time.format("%H:%M")),
            Self::Every(period) => format!("every {}s", period.as_secs()),
        }
    }
}

/// Work fired by the scheduler.
#[async_trait]
pub trait Job: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Run to completion; returns whether the run succeeded.
    async fn run(&self) -> bool;
}

/// Fires one digest run with a fixed lookback.
pub struct DigestJob {
    name: String,
    runner: Arc<DigestRunner>,
    lookback_days: u32,
}

impl DigestJob {
    #[must_use]
    pub fn new(name: impl Into<String>, runner: Arc<DigestRunner>, lookback_days: u32) -> Self {
        Self {
            name: name.into(),
            runner,
            lookback_days,
        }
    }
}

#[async_trait]
impl Job for DigestJob {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> bool {
        self.runner.run(self.lookback_days).await.is_success()
    }
}

struct Entry {
    trigger: Trigger,
    job: Arc<dyn Job>,
    next_due: DateTime<Local>,
}

/// Explicit scheduler; no global registry.
pub struct Scheduler {
    entries: Vec<Entry>,
    poll_interval: Duration,
}

impl Scheduler {
    #[must_use]
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            entries: Vec::new(),
            poll_interval,
        }
    }

    /// Register a job; its first firing is computed from `now`.
    pub fn add_at(&mut self, trigger: Trigger, job: Arc<dyn Job>, now: DateTime<Local>) -> &mut Self {
        // Fall back to a day out if the trigger cannot be resolved (date overflow).
        let next_due = trigger
            .next_after(&now)
            .unwrap_or_else(|| now + chrono::Duration::days(1));
        tracing::info!(
            job = job.name(),
            trigger = %trigger.describe(),
            next_due = %next_due.format("%Y-%m-%d %H:%M:%S"),
            "Scheduled job"
        );
        self.entries.push(Entry {
            trigger,
            job,
            next_due,
        });
        self
    }

    /// Register a job relative to the current local time.
    pub fn add(&mut self, trigger: Trigger, job: Arc<dyn Job>) -> &mut Self {
        self.add_at(trigger, job, Local::now())
    }

    /// Register the daily digest, plus a fast interval job when `test_interval` is set.
    pub fn add_digest_jobs(
        &mut self,
        runner: &Arc<DigestRunner>,
        daily_at: NaiveTime,
        test_interval: Option<Duration>,
        now: DateTime<Local>,
    ) -> &mut Self {
        if let Some(interval) = test_interval {
            self.add_at(
                Trigger::Every(interval),
                Arc::new(DigestJob::new("test-interval", Arc::clone(runner), SCHEDULED_LOOKBACK_DAYS)),
                now,
            );
        }
        self.add_at(
            Trigger::DailyAt(daily_at),
            Arc::new(DigestJob::new("daily", Arc::clone(runner), SCHEDULED_LOOKBACK_DAYS)),
            now,
        )
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Earliest pending firing time.
    #[must_use]
    pub fn next_due(&self) -> Option<DateTime<Local>> {
        self.entries.iter().map(|e| e.next_due).min()
    }

    /// Jobs due at `now`, in registration order.
    ///
    /// Each returned entry is rescheduled strictly after `now`, so any
    /// occurrences missed while busy collapse into this one.
    pub fn take_due(&mut self, now: DateTime<Local>) -> Vec<Arc<dyn Job>> {
        let mut due = Vec::new();
        for entry in &mut self.entries {
            if entry.next_due > now {
                continue;
            }
            entry.next_due = entry
                .trigger
                .next_after(&now)
                .unwrap_or_else(|| now + chrono::Duration::days(1));
            due.push(Arc::clone(&entry.job));
        }
        due
    }

    /// Run every job that is due now, sequentially.
    pub async fn run_pending(&mut self) -> usize {
        let due = self.take_due(Local::now());
        let count = due.len();
        for job in due {
            tracing::debug!(job = job.name(), "Running scheduled job");
            let ok = job.run().await;
            tracing::debug!(job = job.name(), success = ok, "Scheduled job finished");
        }
        count
    }

    /// Poll until `shutdown` resolves.
    ///
    /// A job in progress is not interrupted; shutdown is observed between polls.
    pub async fn run_until<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        if let Some(next) = self.next_due() {
            tracing::info!(
                jobs = self.entries.len(),
                next_due = %next.format("%Y-%m-%d %H:%M:%S"),
                "Scheduler started, press Ctrl+C to exit"
            );
        }

        loop {
            self.run_pending().await;
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("Shutdown requested, scheduler stopped");
                    break;
                }
                () = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }
}
