use std::path::{Path, PathBuf};

/// A static file that may turn out to be unused.
///
/// The size is deliberately not recorded here: only files confirmed unused
/// are ever stat'd, so classification stays IO-free.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub path: PathBuf,
    pub file_name: String,
}

impl Candidate {
    fn new(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_string_lossy().into_owned();
        Some(Self {
            path: path.to_path_buf(),
            file_name,
        })
    }
}

/// Split scanned paths into static-asset candidates and the referencing
/// files their names will be searched in.
///
/// Extension comparison is exact and case-insensitive against the configured
/// dotted extensions (`.png`, `.Html`, ...). A path whose extension sits in
/// both sets lands in both buckets, once each.
pub fn classify(
    paths: &[PathBuf],
    static_exts: &[String],
    referencing_exts: &[String],
) -> (Vec<Candidate>, Vec<PathBuf>) {
    let mut candidates = Vec::new();
    let mut referencing = Vec::new();

    for path in paths {
        let Some(ext) = dotted_extension(path) else {
            continue;
        };

        if in_extension_set(&ext, static_exts) {
            if let Some(candidate) = Candidate::new(path) {
                candidates.push(candidate);
            }
        }

        if in_extension_set(&ext, referencing_exts) {
            referencing.push(path.clone());
        }
    }

    (candidates, referencing)
}

/// Lowercased extension including the leading dot, e.g. `.png`.
fn dotted_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
    Some(format!(".{ext}"))
}

fn in_extension_set(ext: &str, set: &[String]) -> bool {
    set.iter().any(|configured| configured.eq_ignore_ascii_case(ext))
}
