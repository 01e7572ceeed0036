use std::path::{Path, PathBuf};

use clap::ValueEnum;
use color_eyre::eyre::Result;
use serde::{Deserialize, Serialize};

/// Which reference-search strategy a run uses.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Spawn ripgrep per candidate. Fast on large trees, needs `rg`.
    Indexed,
    /// Read the referencing files once and match in-process.
    #[default]
    Linear,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Glob patterns for files and directories excluded from the scan and
    /// from the reference search.
    pub ignore: Vec<String>,
    /// Extensions (with leading dot) of files that are candidates for
    /// deletion when nothing references them.
    pub static_extensions: Vec<String>,
    /// Extensions of files whose text may reference static assets.
    pub referencing_extensions: Vec<String>,
    pub backend: Backend,
    /// Upper bound on concurrent reference checks. Defaults to the machine's
    /// available parallelism when unset.
    pub concurrency: Option<usize>,
    /// Explicit ripgrep binary for the indexed backend; `rg` on PATH when
    /// unset.
    pub ripgrep_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ignore: to_strings(&[
                "node_modules",
                ".git",
                "dist",
                "build",
                "out",
                "coverage",
                "target",
            ]),
            static_extensions: to_strings(&[
                ".png", ".jpg", ".jpeg", ".gif", ".webp", ".avif", ".svg", ".ico", ".bmp",
                ".mp4", ".webm", ".mp3", ".wav", ".ogg", ".woff", ".woff2", ".ttf", ".otf",
                ".eot",
            ]),
            referencing_extensions: to_strings(&[
                ".html", ".htm", ".css", ".scss", ".sass", ".less", ".js", ".jsx", ".ts",
                ".tsx", ".mjs", ".cjs", ".vue", ".json", ".md",
            ]),
            backend: Backend::default(),
            concurrency: None,
            ripgrep_path: None,
        }
    }
}

fn to_strings(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| (*s).to_string()).collect()
}

impl Config {
    /// Load `~/.fua/config.toml`, writing one with the defaults first if the
    /// user does not have one yet.
    pub async fn load() -> Result<Self> {
        let home_dir = dirs::home_dir().expect("Could not determine home directory");
        Self::load_from(&home_dir.join(".fua")).await
    }

    pub async fn load_from(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join("config.toml");

        if config_path.exists() {
            let contents = tokio::fs::read_to_string(&config_path).await?;
            Ok(toml::from_str(&contents)?)
        } else {
            // Create default config
            let config = Self::default();
            tokio::fs::create_dir_all(config_dir).await?;
            let contents = toml::to_string_pretty(&config)?;
            tokio::fs::write(&config_path, contents).await?;
            Ok(config)
        }
    }

    /// Effective concurrency cap for a run.
    pub fn concurrency_limit(&self) -> usize {
        self.concurrency.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(std::num::NonZeroUsize::get)
                .unwrap_or(4)
        })
    }

    /// Include globs covering every configured extension, static and
    /// referencing alike; this is what the scanner keeps.
    pub fn include_globs(&self) -> Vec<String> {
        self.static_extensions
            .iter()
            .chain(self.referencing_extensions.iter())
            .map(|ext| format!("*{ext}"))
            .collect()
    }
}
