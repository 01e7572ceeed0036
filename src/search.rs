use std::path::{Path, PathBuf};
use std::process::Stdio;

use color_eyre::eyre::{Result, WrapErr};
use regex::RegexBuilder;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::classify::Candidate;
use crate::config::Config;

/// The reference-search strategy, chosen once when a run starts.
///
/// Both variants answer the same question: does the candidate's file name
/// appear anywhere in the referencing files? Matching is a case-insensitive
/// literal in both.
pub enum Searcher {
    Indexed(IndexedSearch),
    Linear(LinearSearch),
}

impl Searcher {
    pub async fn is_unused(&self, candidate: &Candidate) -> Result<bool> {
        match self {
            Searcher::Indexed(indexed) => indexed.is_unused(candidate).await,
            Searcher::Linear(linear) => linear.is_unused(candidate),
        }
    }
}

/// What a single ripgrep invocation told us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SearchVerdict {
    Used,
    Unused,
    /// The exit code / output combination matched neither "found" nor
    /// "not found". Treated as used: an uncertain search must never get a
    /// file deleted.
    Uncertain,
}

/// Delegates each check to a ripgrep subprocess over the project tree.
pub struct IndexedSearch {
    program: PathBuf,
    root: PathBuf,
    ignore: Vec<String>,
    referencing_exts: Vec<String>,
    cancel: CancellationToken,
}

impl IndexedSearch {
    pub fn new(root: &Path, config: &Config, cancel: CancellationToken) -> Self {
        Self {
            program: config
                .ripgrep_path
                .clone()
                .unwrap_or_else(|| PathBuf::from("rg")),
            root: root.to_path_buf(),
            ignore: config.ignore.clone(),
            referencing_exts: config.referencing_extensions.clone(),
            cancel,
        }
    }

    async fn is_unused(&self, candidate: &Candidate) -> Result<bool> {
        let args = rg_args(
            &candidate.file_name,
            &self.root,
            &self.ignore,
            &self.referencing_exts,
        );

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // A cancelled run drops the output future, which kills the child.
        let output = tokio::select! {
            () = self.cancel.cancelled() => return Ok(false),
            result = command.output() => result.wrap_err_with(|| {
                format!("could not launch {}", self.program.display())
            })?,
        };

        match interpret_rg_output(output.status.code(), &output.stdout, &output.stderr) {
            SearchVerdict::Unused => Ok(true),
            SearchVerdict::Used => Ok(false),
            SearchVerdict::Uncertain => {
                eprintln!(
                    "Warning: inconclusive search for {} (exit code {:?}); keeping the file",
                    candidate.file_name,
                    output.status.code()
                );
                Ok(false)
            }
        }
    }
}

/// Argument list for one ripgrep invocation: case-insensitive fixed-string
/// count over the referencing extensions, minus the ignored paths.
pub(crate) fn rg_args(
    term: &str,
    root: &Path,
    ignore: &[String],
    referencing_exts: &[String],
) -> Vec<String> {
    let mut args = vec![
        "--fixed-strings".to_string(),
        term.to_string(),
        root.display().to_string(),
        "-i".to_string(),
        "--hidden".to_string(),
        "--count-matches".to_string(),
        "--no-filename".to_string(),
    ];

    for pattern in ignore {
        args.push("-g".to_string());
        args.push(format!("!{pattern}"));
    }

    for ext in referencing_exts {
        args.push("-g".to_string());
        args.push(format!("*{ext}"));
    }

    args
}

/// Exit code 1 with silent streams is ripgrep's "no match anywhere" — the
/// only combination that may mark a file unused. Exit 0 with output is a
/// match. Everything else is uncertain.
pub(crate) fn interpret_rg_output(code: Option<i32>, stdout: &[u8], stderr: &[u8]) -> SearchVerdict {
    match code {
        Some(1) if stdout.is_empty() && stderr.is_empty() => SearchVerdict::Unused,
        Some(0) if !stdout.is_empty() => SearchVerdict::Used,
        _ => SearchVerdict::Uncertain,
    }
}

/// One cached referencing file. Content is loaded once and shared read-only
/// across every candidate check.
struct HaystackFile {
    path: PathBuf,
    content: String,
}

/// Matches candidates in-process against cached referencing-file contents.
pub struct LinearSearch {
    files: Vec<HaystackFile>,
    cancel: CancellationToken,
}

impl LinearSearch {
    /// Read every referencing file up front. An unreadable file fails the
    /// whole run; contents that are not valid UTF-8 are converted lossily so
    /// the literal match can still run over them.
    pub async fn load(paths: &[PathBuf], cancel: CancellationToken) -> Result<Self> {
        let mut files = Vec::with_capacity(paths.len());

        for path in paths {
            let bytes = tokio::fs::read(path)
                .await
                .wrap_err_with(|| format!("could not read {}", path.display()))?;
            files.push(HaystackFile {
                path: path.clone(),
                content: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        Ok(Self { files, cancel })
    }

    fn is_unused(&self, candidate: &Candidate) -> Result<bool> {
        let needle = RegexBuilder::new(&regex::escape(&candidate.file_name))
            .case_insensitive(true)
            .build()
            .wrap_err_with(|| format!("could not match against {}", candidate.file_name))?;

        for file in &self.files {
            // Honored between file comparisons so a cancel request takes
            // effect within one comparison's latency. The conservative
            // answer is fine: a cancelled run discards all results.
            if self.cancel.is_cancelled() {
                return Ok(false);
            }

            if needle.is_match(&file.content) {
                return Ok(false);
            }
        }

        Ok(true)
    }

    #[cfg(test)]
    fn from_contents(contents: Vec<(PathBuf, String)>) -> Self {
        Self {
            files: contents
                .into_iter()
                .map(|(path, content)| HaystackFile { path, content })
                .collect(),
            cancel: CancellationToken::new(),
        }
    }
}

impl std::fmt::Debug for LinearSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinearSearch")
            .field("files", &self.files.iter().map(|h| &h.path).collect::<Vec<_>>())
            .finish()
    }
}
