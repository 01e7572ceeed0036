use std::fs;
use std::path::{Path, PathBuf};

use fua::config::{Backend, Config};
use fua::{find_unused, report, FindOutcome, Verbosity};
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

fn test_config() -> Config {
    Config {
        ignore: Vec::new(),
        static_extensions: vec![".png".to_string()],
        referencing_extensions: vec![".html".to_string()],
        backend: Backend::Linear,
        concurrency: Some(2),
        ripgrep_path: None,
    }
}

fn write(path: &Path, contents: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

async fn detect(root: &Path, config: &Config) -> FindOutcome {
    find_unused(root, config, Verbosity::Quiet, CancellationToken::new())
        .await
        .unwrap()
}

#[tokio::test]
async fn finds_the_unreferenced_asset_and_spares_the_referenced_one() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root.join("a.png"), b"orphan");
    write(&root.join("b.png"), b"wanted");
    write(&root.join("index.html"), br#"<img src="b.png">"#);

    let outcome = detect(&root, &test_config()).await;

    let summary = match outcome {
        FindOutcome::Completed(summary) => summary,
        FindOutcome::Cancelled => panic!("run should have completed"),
    };
    assert_eq!(summary.unused_count, 1);
    assert_eq!(summary.total_size, "6b");
    assert_eq!(summary.artifact, root.join("unused.json"));

    let records = report::read_artifact(&summary.artifact).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].path, root.join("a.png"));
    assert_eq!(records[0].size, "6b");
}

#[tokio::test]
async fn records_are_sorted_largest_first() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root.join("small.png"), b"ab");
    write(&root.join("large.png"), &vec![0u8; 2048]);
    write(&root.join("index.html"), b"<p>no images here</p>");

    let outcome = detect(&root, &test_config()).await;

    let FindOutcome::Completed(summary) = outcome else {
        panic!("run should have completed");
    };
    let records = report::read_artifact(&summary.artifact).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].path, root.join("large.png"));
    assert_eq!(records[0].size, "2.00Kb");
    assert_eq!(records[1].path, root.join("small.png"));
    assert_eq!(records[1].size, "2b");
    assert_eq!(summary.total_size, "2.00Kb");
}

#[tokio::test]
async fn repeated_runs_write_identical_artifacts() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    // equal sizes force the path tie-break to carry the ordering
    write(&root.join("z.png"), b"same size");
    write(&root.join("a.png"), b"same size");
    write(&root.join("m.png"), b"bigger than both");
    write(&root.join("index.html"), b"<p>nothing used</p>");

    let config = test_config();

    let first = match detect(&root, &config).await {
        FindOutcome::Completed(summary) => fs::read_to_string(&summary.artifact).unwrap(),
        FindOutcome::Cancelled => panic!("run should have completed"),
    };
    let second = match detect(&root, &config).await {
        FindOutcome::Completed(summary) => fs::read_to_string(&summary.artifact).unwrap(),
        FindOutcome::Cancelled => panic!("run should have completed"),
    };

    assert_eq!(first, second);
}

#[tokio::test]
async fn a_cancelled_run_writes_no_artifact() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root.join("a.png"), b"data");
    write(&root.join("index.html"), b"<p></p>");

    let token = CancellationToken::new();
    token.cancel();

    let outcome = find_unused(&root, &test_config(), Verbosity::Quiet, token)
        .await
        .unwrap();

    assert!(matches!(outcome, FindOutcome::Cancelled));
    assert!(!root.join("unused.json").exists());
}

#[tokio::test]
async fn overlapping_extension_sets_check_self_references_honestly() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    // referenced.svg is named inside page.svg; orphan.svg appears nowhere
    // (its own markup does not spell out its file name)
    write(&root.join("orphan.svg"), b"<svg><circle r=\"1\"/></svg>");
    write(
        &root.join("page.svg"),
        b"<svg><!-- see referenced.svg --></svg>",
    );
    write(&root.join("referenced.svg"), b"<svg></svg>");

    let config = Config {
        static_extensions: vec![".svg".to_string()],
        referencing_extensions: vec![".svg".to_string()],
        ..test_config()
    };

    let FindOutcome::Completed(summary) = detect(&root, &config).await else {
        panic!("run should have completed");
    };
    let records = report::read_artifact(&summary.artifact).await.unwrap();
    let paths: Vec<PathBuf> = records.iter().map(|r| r.path.clone()).collect();

    assert!(paths.contains(&root.join("orphan.svg")));
    assert!(paths.contains(&root.join("page.svg")));
    assert!(!paths.contains(&root.join("referenced.svg")));
}

#[tokio::test]
async fn ignored_directories_are_invisible_to_detection() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root.join("a.png"), b"top level");
    write(&root.join("node_modules/lib/b.png"), b"vendored");
    // the only reference to a.png lives in an ignored directory, so it must
    // not count
    write(
        &root.join("node_modules/lib/page.html"),
        br#"<img src="a.png">"#,
    );

    let config = Config {
        ignore: vec!["node_modules".to_string()],
        ..test_config()
    };

    let FindOutcome::Completed(summary) = detect(&root, &config).await else {
        panic!("run should have completed");
    };
    let records = report::read_artifact(&summary.artifact).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].path, root.join("a.png"));
}

#[tokio::test]
async fn an_empty_project_still_writes_an_empty_list() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();

    let FindOutcome::Completed(summary) = detect(&root, &test_config()).await else {
        panic!("run should have completed");
    };

    assert_eq!(summary.unused_count, 0);
    assert_eq!(summary.total_size, "0b");
    let records = report::read_artifact(&summary.artifact).await.unwrap();
    assert!(records.is_empty());
}
