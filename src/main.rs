#![warn(
    // clippy::pedantic,
    clippy::complexity,
    clippy::correctness,
    clippy::perf
)]
use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::{ensure, Result};
use fua::{cli::Cli, config::Config, find_unused, report, FindOutcome, Verbosity};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // Exactly one project root; refusing several up front beats scanning the
    // wrong one.
    ensure!(
        cli.dir.len() == 1,
        "only one project directory may be given, got {}: {:?}",
        cli.dir.len(),
        cli.dir
    );

    // Load config, then layer the per-run CLI overrides on top
    let mut config = Config::load().await?;
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = Some(concurrency);
    }
    config.ignore.extend(cli.ignore.iter().cloned());

    let search_parent = match cli.dir[0].as_str() {
        "." => std::env::current_dir()?,
        other => PathBuf::from(other),
    };

    // check to make sure the provided search directory exists
    assert!(
        search_parent.is_dir(),
        "The provided search directory, {}, does not exist on the user's system or is outside of user permissions",
        search_parent.display()
    );

    // the result list records absolute paths, so resolve the root up front
    let search_parent = search_parent.canonicalize()?;

    let verbosity = Verbosity::new_from_bools(cli.verbose, cli.quiet);

    if cli.apply {
        return handle_apply(&search_parent, &cli, verbosity).await;
    }

    // Create a cancellation token
    let cancellation_token = CancellationToken::new();
    let cancel_clone = cancellation_token.clone();

    // Set up Ctrl+C handler for graceful shutdown
    let shutdown_handle = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                eprintln!("\nInterrupted! Letting in-flight checks finish, then stopping...");
                cancel_clone.cancel();
            }
            Err(err) => {
                eprintln!("Failed to listen for Ctrl+C signal: {err}");
            }
        }
    });

    let result = find_unused(&search_parent, &config, verbosity, cancellation_token).await;

    // Cancel the signal handler since we're exiting
    shutdown_handle.abort();

    match result? {
        // the run printed its own summary
        FindOutcome::Completed(_) => {}
        FindOutcome::Cancelled => {
            if verbosity.is_verbose() {
                eprintln!("Cancelled; no result list was written.");
            }
        }
    }

    Ok(())
}

async fn handle_apply(search_parent: &Path, cli: &Cli, verbosity: Verbosity) -> Result<()> {
    let artifact = report::artifact_path(search_parent);

    if cli.dry {
        let records = report::read_artifact(&artifact).await?;
        for record in &records {
            println!("{} ({})", record.path.display(), record.size);
        }
        eprintln!("{} files would be deleted.", records.len());
        return Ok(());
    }

    let confirmed = cli.yes || confirm_on_stdin()?;
    if !confirmed {
        eprintln!("Nothing deleted.");
        return Ok(());
    }

    let deleted = report::apply_deletions(&artifact, confirmed).await?;
    if verbosity.is_not_quiet() {
        eprintln!("Deleted {} files listed in {}.", deleted, artifact.display());
    }

    Ok(())
}

fn confirm_on_stdin() -> Result<bool> {
    eprint!(
        "Type 'yes' to delete every file listed in {} (back up anything you care about first): ",
        report::ARTIFACT_NAME
    );
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(answer.trim() == "yes")
}
