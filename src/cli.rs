use clap::Parser;

use crate::config::Backend;

/// A command line tool that finds static resource files (images, fonts,
/// media) never referenced by name anywhere in a project's source, markup,
/// or style files, and deletes them on request. Detection writes the list to
/// `unused.json` in the scanned directory; `--apply` deletes what it lists.
#[derive(Parser)]
#[clap(name = "fua")]
#[clap(version = "v0.1.0")]
pub struct Cli {
    /// Increase the logging of detailed information as `fua` progresses
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Reduce the logging of detailed information as `fua` progresses
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,

    /// Which reference-search backend to use, overriding the configured one
    #[arg(short, long, value_enum)]
    pub backend: Option<Backend>,

    /// How many reference checks may run at once, overriding the configured
    /// limit
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Extra ignore glob, appended to the configured set (repeatable)
    #[arg(short, long)]
    pub ignore: Vec<String>,

    /// Delete the files listed in `unused.json` instead of running a
    /// detection
    #[arg(long, default_value_t = false)]
    pub apply: bool,

    /// Skip the confirmation prompt when deleting
    #[arg(short, long, default_value_t = false)]
    pub yes: bool,

    /// With `--apply`, list what would be deleted without touching anything
    #[arg(short, long, default_value_t = false)]
    pub dry: bool,

    /// The project directory to scan (exactly one)
    #[arg(default_value = ".")]
    pub dir: Vec<String>,
}
