use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr};
use glob::{glob, Pattern};
use indicatif::ProgressBar;

use crate::Verbosity;

/// Walk the project tree once and return every file worth looking at.
///
/// `ignore` and `include` are glob patterns. A path is dropped when an ignore
/// pattern matches either its root-relative form or any single path component
/// (so a bare `node_modules` excludes the whole directory and `*.min.js`
/// excludes by file name). Of what remains, only files whose name matches at
/// least one include pattern are returned. Ordering is whatever the walk
/// yields; nothing downstream depends on it.
pub fn scan_project(
    root: &Path,
    ignore: &[String],
    include: &[String],
    verbosity: Verbosity,
) -> Result<Vec<PathBuf>> {
    let ignore_patterns = compile_patterns(ignore)?;
    let include_patterns = compile_patterns(include)?;

    let spinner = if verbosity.is_not_quiet() {
        let spinner = ProgressBar::new_spinner();
        spinner.set_message("Scanning project files.");
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    } else {
        ProgressBar::hidden()
    };

    let pattern = format!("{}/**/*", root.display());
    let mut hits = Vec::new();
    let mut searched: usize = 0;

    for entry in glob(&pattern).wrap_err("could not walk the project directory")? {
        searched += 1;

        // Entries the walker could not read are skipped, not fatal.
        let Ok(path) = entry else { continue };

        if !path.is_file() || is_ignored(&path, root, &ignore_patterns) {
            continue;
        }

        if matches_any_name(&path, &include_patterns) {
            hits.push(path);
        }

        if searched % 100 == 0 {
            spinner.set_message(format!(
                "Searched {} paths, kept {} files",
                searched,
                hits.len()
            ));
        }
    }

    spinner.finish_and_clear();

    Ok(hits)
}

fn compile_patterns(raw: &[String]) -> Result<Vec<Pattern>> {
    raw.iter()
        .map(|p| Pattern::new(p).wrap_err_with(|| format!("invalid glob pattern: {p}")))
        .collect()
}

fn is_ignored(path: &Path, root: &Path, patterns: &[Pattern]) -> bool {
    if patterns.is_empty() {
        return false;
    }

    let relative = path.strip_prefix(root).unwrap_or(path);
    let relative_str = relative.to_string_lossy();

    patterns.iter().any(|pattern| {
        pattern.matches(&relative_str)
            || relative
                .components()
                .any(|part| pattern.matches(&part.as_os_str().to_string_lossy()))
    })
}

fn matches_any_name(path: &Path, patterns: &[Pattern]) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    let name = name.to_string_lossy();

    patterns.iter().any(|pattern| pattern.matches(&name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn keeps_only_included_extensions() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("a.png"));
        touch(&root.join("notes.txt"));
        touch(&root.join("sub/b.html"));

        let found = scan_project(
            root,
            &[],
            &["*.png".to_string(), "*.html".to_string()],
            Verbosity::Quiet,
        )
        .unwrap();

        let mut names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.png", "b.html"]);
    }

    #[test]
    fn ignore_pattern_excludes_whole_directories() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("a.png"));
        touch(&root.join("node_modules/pkg/b.png"));

        let found = scan_project(
            root,
            &["node_modules".to_string()],
            &["*.png".to_string()],
            Verbosity::Quiet,
        )
        .unwrap();

        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("a.png"));
    }

    #[test]
    fn ignore_pattern_excludes_by_file_name() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("app.js"));
        touch(&root.join("app.min.js"));

        let found = scan_project(
            root,
            &["*.min.js".to_string()],
            &["*.js".to_string()],
            Verbosity::Quiet,
        )
        .unwrap();

        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("app.js"));
    }

    #[test]
    fn invalid_ignore_glob_is_an_error() {
        let dir = tempdir().unwrap();

        let result = scan_project(
            dir.path(),
            &["[".to_string()],
            &["*.png".to_string()],
            Verbosity::Quiet,
        );

        assert!(result.is_err());
    }
}
