//! Digest runner - orchestrates the fetch, summarize, deliver flow.
//!
//! Each run walks `Idle -> Fetching -> Summarizing -> Delivering` and ends
//! in `Completed` or `Failed`. A run never returns an error: every failure
//! is captured in the returned [`RunOutcome`].

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::delivery::Delivery;
use crate::error::RunError;
use crate::fetcher::Fetcher;
use crate::summary::Summary;

/// Log marker emitted when a run starts.
pub const MARKER_START: &str = "DIGEST_RUN_START";
/// Log marker for a delivered digest with papers.
pub const MARKER_SENT_PAPERS: &str = "DIGEST_SENT_PAPERS";
/// Log marker for a delivered "no new papers" notice.
pub const MARKER_SENT_EMPTY: &str = "DIGEST_SENT_EMPTY";
/// Log marker for a failed run.
pub const MARKER_FAILED: &str = "DIGEST_FAILED";

/// Phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Fetching,
    Summarizing,
    Delivering,
    Completed,
    Failed,
}

impl RunPhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Summarizing => "summarizing",
            Self::Delivering => "delivering",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one run.
#[derive(Debug)]
pub struct RunOutcome {
    /// Correlates the log lines of one run.
    pub run_id: Uuid,
    pub lookback_days: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Terminal phase, `Completed` or `Failed`.
    pub phase: RunPhase,
    /// Papers selected by the fetch (0 if the fetch failed).
    pub papers_found: usize,
    /// Summaries that fell back to degraded text.
    pub degraded_summaries: usize,
    /// Why the run failed.
    pub error: Option<RunError>,
}

impl RunOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.phase == RunPhase::Completed
    }
}

/// Drives single runs of the digest pipeline.
pub struct DigestRunner {
    fetcher: Fetcher,
    delivery: Arc<dyn Delivery>,
}

/// Tracks phase transitions for one run.
struct RunState {
    run_id: Uuid,
    lookback_days: u32,
    started_at: DateTime<Utc>,
    phase: RunPhase,
}

impl RunState {
    fn advance(&mut self, next: RunPhase) {
        tracing::debug!(run_id = %self.run_id, from = %self.phase, to = %next, "Run phase");
        self.phase = next;
    }

    /// Outcome in the current (terminal) phase.
    fn finish(self, papers_found: usize, degraded: usize, error: Option<RunError>) -> RunOutcome {
        debug_assert!(self.phase.is_terminal());
        RunOutcome {
            run_id: self.run_id,
            lookback_days: self.lookback_days,
            started_at: self.started_at,
            finished_at: Utc::now(),
            phase: self.phase,
            papers_found,
            degraded_summaries: degraded,
            error,
        }
    }
}

impl DigestRunner {
    #[must_use]
    pub fn new(fetcher: Fetcher, delivery: Arc<dyn Delivery>) -> Self {
        Self { fetcher, delivery }
    }

    /// Execute one complete run with the given lookback.
    pub async fn run(&self, lookback_days: u32) -> RunOutcome {
        let started_at = Utc::now();
        let mut state = RunState {
            run_id: Uuid::new_v4(),
            lookback_days,
            started_at,
            phase: RunPhase::Idle,
        };
        let run_id = state.run_id;

        tracing::info!(
            marker = MARKER_START,
            %run_id,
            lookback_days,
            started_at = %started_at.format("%Y-%m-%d %H:%M:%S"),
            "Starting arXiv digest run"
        );

        state.advance(RunPhase::Fetching);
        let papers = match self.fetcher.fetch_recent(lookback_days).await {
            Ok(papers) => papers,
            Err(e) => {
                state.advance(RunPhase::Failed);
                tracing::error!(
                    marker = MARKER_FAILED,
                    %run_id,
                    stage = "fetch",
                    error = %e,
                    "Digest run failed: could not fetch papers, no digest sent"
                );
                return state.finish(0, 0, Some(e.into()));
            }
        };

        state.advance(RunPhase::Summarizing);
        let mut summaries = Vec::with_capacity(papers.len());
        for paper in &papers {
            let summary = match self.fetcher.summarize(paper).await {
                Ok(summary) => summary,
                Err(e) => {
                    tracing::warn!(%run_id, id = %paper.id, error = %e, "Summary unavailable, using placeholder");
                    Summary::placeholder(&e)
                }
            };
            summaries.push(summary);
        }
        let degraded = summaries.iter().filter(|s| s.is_degraded()).count();

        if papers.is_empty() {
            tracing::info!(%run_id, "No matching papers found, sending \"no new papers\" notice");
        } else {
            tracing::info!(%run_id, papers = papers.len(), degraded, "Found {} papers", papers.len());
        }

        state.advance(RunPhase::Delivering);
        match self.delivery.send(&papers, &summaries).await {
            Ok(()) => {
                state.advance(RunPhase::Completed);
                if papers.is_empty() {
                    tracing::info!(
                        marker = MARKER_SENT_EMPTY,
                        %run_id,
                        delivery = self.delivery.name(),
                        papers = 0,
                        "Digest run completed: sent no new papers notice"
                    );
                } else {
                    tracing::info!(
                        marker = MARKER_SENT_PAPERS,
                        %run_id,
                        delivery = self.delivery.name(),
                        papers = papers.len(),
                        degraded,
                        "Digest run completed: sent {} papers",
                        papers.len()
                    );
                }
                state.finish(papers.len(), degraded, None)
            }
            Err(e) => {
                state.advance(RunPhase::Failed);
                tracing::error!(
                    marker = MARKER_FAILED,
                    %run_id,
                    stage = "delivery",
                    delivery = self.delivery.name(),
                    papers = papers.len(),
                    error = %e,
                    "Digest run failed: delivery error"
                );
                state.finish(papers.len(), degraded, Some(e.into()))
            }
        }
    }
}
