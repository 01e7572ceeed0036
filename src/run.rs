use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr};
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::classify::Candidate;
use crate::report::UnusedFile;
use crate::search::Searcher;
use crate::Verbosity;

/// How often the progress reporter recomputes the completion percentage.
const REPORT_INTERVAL: Duration = Duration::from_millis(500);

/// State shared between the check tasks and the progress reporter.
///
/// The completed counter is the only concurrently mutated value; workers bump
/// it, the reporter reads it from its own timer task.
pub struct RunState {
    total: usize,
    completed: AtomicUsize,
    cancel: CancellationToken,
}

impl RunState {
    pub fn new(total: usize, cancel: CancellationToken) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
            cancel,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    fn mark_done(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Completion percentage, floored. An empty run is complete by
    /// definition.
    pub fn percent(&self) -> u64 {
        if self.total == 0 {
            100
        } else {
            (self.completed().min(self.total) * 100 / self.total) as u64
        }
    }
}

/// How a run of checks ended, when it did not fail outright.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every candidate was checked; these were confirmed unused.
    Completed(Vec<UnusedFile>),
    /// Cancellation was requested. In-flight checks were allowed to finish
    /// but their results are discarded.
    Cancelled,
}

/// Check every candidate against the searcher, at most `limit` at a time.
///
/// The next pending check starts as soon as a running one finishes. The first
/// failing check aborts the whole run: accumulated results are discarded and
/// in-flight sibling checks are dropped (which also kills any search
/// subprocess they spawned). Returns exactly once, with the error, a
/// cancellation notice, or the full result set.
pub async fn run_checks(
    candidates: Vec<Candidate>,
    searcher: &Searcher,
    state: &RunState,
    limit: usize,
    verbosity: Verbosity,
) -> Result<RunOutcome> {
    let limit = limit.max(1);

    let mut checks = stream::iter(candidates.into_iter().map(|candidate| async move {
        // Cancellation stops new checks from starting; running ones finish.
        if state.is_cancelled() {
            return Ok(None);
        }

        let unused = searcher.is_unused(&candidate).await?;
        let hit = if unused {
            let meta = tokio::fs::metadata(&candidate.path)
                .await
                .wrap_err_with(|| format!("could not stat {}", candidate.path.display()))?;
            if verbosity.is_verbose() {
                eprintln!("Unused: {}", candidate.path.display());
            }
            Some(UnusedFile {
                path: candidate.path,
                size: meta.len(),
            })
        } else {
            None
        };

        state.mark_done();
        Ok::<_, color_eyre::eyre::Report>(hit)
    }))
    .buffer_unordered(limit);

    let mut hits = Vec::new();
    while let Some(result) = checks.next().await {
        if let Some(hit) = result? {
            hits.push(hit);
        }
    }
    drop(checks);

    if state.is_cancelled() {
        return Ok(RunOutcome::Cancelled);
    }

    Ok(RunOutcome::Completed(hits))
}

/// Tick every half second, advancing the bar by the percentage gained since
/// the previous tick. Ends on its own at 100% or on cancellation; the
/// orchestrator additionally aborts it on every exit path so a failed run
/// cannot leak the timer.
pub fn spawn_reporter(bar: ProgressBar, state: Arc<RunState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(REPORT_INTERVAL);
        let mut last_percent = 0u64;

        loop {
            tokio::select! {
                () = state.cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let percent = state.percent();
                    if percent > last_percent {
                        bar.inc(percent - last_percent);
                        last_percent = percent;
                    }
                    if state.completed() >= state.total() {
                        break;
                    }
                }
            }
        }
    })
}
