// Real process execution against a shell-script stand-in for mkvmerge
#![cfg(unix)]

use crate::common::helpers::{RecordingObserver, Season, touch};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use trackmux::engine::{
    BatchOptions, BatchOutcome, BatchRunner, MergeCommand, Mkvmerge, ToolLocator, VideoStatus,
    run_merge_cmd,
};

/// Writes `-o <out>` as an empty file; inputs named *fail* exit 2 with a stderr message
const FAKE_MKVMERGE: &str = r#"#!/bin/sh
out="$2"
case "$3" in
  *fail*)
    echo "Error: The file '$3' could not be opened for reading." >&2
    exit 2
    ;;
esac
echo "Progress: 100%"
: > "$out"
exit 0
"#;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[test]
fn test_batch_with_real_process() {
    let season = Season::new();
    season.video("ep01.mkv");
    season.video("ep02_fail.mkv");
    touch(&season.subs, "ep01.srt");
    let script = write_script(&season.temp.path().join("bin"), "mkvmerge", FAKE_MKVMERGE);

    let locator = ToolLocator::new("mkvmerge")
        .without_search_path()
        .with_explicit(&script);
    let mut observer = RecordingObserver::default();
    let report = BatchRunner::new(
        Mkvmerge::new(locator),
        season.request(),
        BatchOptions::default(),
    )
    .run(&mut observer);

    assert_eq!(report.outcome, BatchOutcome::Completed);
    assert!(report.videos[0].status.is_merged());
    assert!(season.output.join("ep01_merged.mkv").exists());

    assert_eq!(report.videos[1].status, VideoStatus::Failed);
    let expected = format!(
        "Error: The file '{}' could not be opened for reading.\n",
        season.source.join("ep02_fail.mkv").display()
    );
    assert!(observer.statuses.contains(&expected));
    assert_eq!(observer.progress, vec![50, 100]);
}

#[test]
fn test_large_output_on_both_streams_does_not_deadlock() {
    let temp = tempfile::TempDir::new().unwrap();
    let script = write_script(
        temp.path(),
        "noisy",
        "#!/bin/sh\nyes out | head -c 300000\nyes err | head -c 300000 >&2\nexit 3\n",
    );

    let output = run_merge_cmd(&MergeCommand {
        program: script,
        args: Vec::new(),
    })
    .unwrap();

    assert_eq!(output.code, Some(3));
    assert!(!output.success());
    assert_eq!(output.stderr.len(), 300000);
    assert!(output.stdout.len() >= 299000);
}

#[test]
fn test_non_executable_tool_fails_to_launch() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("mkvmerge");
    fs::write(&path, FAKE_MKVMERGE).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

    let season = Season::new();
    season.video("ep01.mkv");
    season.video("ep02.mkv");

    let locator = ToolLocator::new("mkvmerge")
        .without_search_path()
        .with_explicit(&path);
    let mut observer = RecordingObserver::default();
    let report = BatchRunner::new(
        Mkvmerge::new(locator),
        season.request(),
        BatchOptions::default(),
    )
    .run(&mut observer);

    assert_eq!(report.outcome, BatchOutcome::Halted);
    assert_eq!(report.videos[0].status, VideoStatus::Failed);
    assert_eq!(report.videos[1].status, VideoStatus::Skipped);
    assert!(observer.progress.is_empty());
}
