#![crate_name = "fua"]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use color_eyre::eyre::Result;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

pub mod classify;
pub mod cli;
pub mod config;
pub mod report;
pub mod run;
pub mod scanner;
pub mod search;

use classify::classify;
use config::{Backend, Config};
use run::{run_checks, spawn_reporter, RunOutcome, RunState};
use search::{IndexedSearch, LinearSearch, Searcher};

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

impl Verbosity {
    pub fn new_from_bools(verbose: bool, quiet: bool) -> Self {
        match (verbose, quiet) {
            (true, true) => Self::Normal,
            (true, false) => Self::Verbose,
            (false, true) => Self::Quiet,
            (false, false) => Self::Normal,
        }
    }

    pub fn is_verbose(self) -> bool {
        matches!(self, Verbosity::Verbose)
    }

    pub fn is_not_quiet(self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}

/// What a completed detection run found.
#[derive(Debug)]
pub struct DetectionSummary {
    pub unused_count: usize,
    /// Combined size of every unused file, human-formatted.
    pub total_size: String,
    /// Where the result list was written.
    pub artifact: PathBuf,
}

/// A detection run either completes with a summary or is cancelled; errors
/// travel separately through `Result`.
#[derive(Debug)]
pub enum FindOutcome {
    Completed(DetectionSummary),
    Cancelled,
}

/// Run the whole detection pipeline over `search_parent`: scan, classify,
/// check every candidate with the configured backend, then sort, persist and
/// summarize the confirmed-unused files.
///
/// A cancelled run writes nothing and reports nothing; a failed run likewise
/// leaves no new result list behind.
pub async fn find_unused(
    search_parent: &Path,
    config: &Config,
    verbosity: Verbosity,
    cancel: CancellationToken,
) -> Result<FindOutcome> {
    let started = Instant::now();

    // walk the tree once, keeping every file either extension set covers
    let paths = scanner::scan_project(
        search_parent,
        &config.ignore,
        &config.include_globs(),
        verbosity,
    )?;

    let (candidates, referencing) = classify(
        &paths,
        &config.static_extensions,
        &config.referencing_extensions,
    );

    // the strategy is picked once, here; the run itself is backend-agnostic
    let searcher = match config.backend {
        Backend::Indexed => {
            Searcher::Indexed(IndexedSearch::new(search_parent, config, cancel.clone()))
        }
        Backend::Linear => {
            Searcher::Linear(LinearSearch::load(&referencing, cancel.clone()).await?)
        }
    };

    let state = Arc::new(RunState::new(candidates.len(), cancel));

    let bar = if verbosity.is_not_quiet() {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template(
                "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% of candidates checked",
            )
            .expect("Could not set up progress bar")
            .progress_chars("=> "),
        );
        bar
    } else {
        ProgressBar::hidden()
    };
    let reporter = spawn_reporter(bar.clone(), Arc::clone(&state));

    let outcome = run_checks(
        candidates,
        &searcher,
        &state,
        config.concurrency_limit(),
        verbosity,
    )
    .await;

    // every exit path passes through here, so the reporter cannot outlive
    // the run whether it completed, failed, or was cancelled
    reporter.abort();
    bar.finish_and_clear();

    let hits = match outcome? {
        RunOutcome::Cancelled => return Ok(FindOutcome::Cancelled),
        RunOutcome::Completed(hits) => hits,
    };

    let (records, total_size) = report::finalize(hits);
    let artifact = report::write_artifact(search_parent, &records).await?;

    let summary = DetectionSummary {
        unused_count: records.len(),
        total_size: report::format_size(total_size),
        artifact,
    };

    if verbosity.is_not_quiet() {
        eprintln!(
            "Found {} unused static files totalling {} in {} ({}); the full list is in {}",
            summary.unused_count,
            summary.total_size,
            search_parent.display(),
            HumanDuration(started.elapsed()),
            summary.artifact.display(),
        );
    }

    Ok(FindOutcome::Completed(summary))
}
