// Batch runner: one sequential pass over the videos of a source directory

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

use super::core::{
    DEFAULT_OUTPUT_SUFFIX, DEFAULT_VIDEO_EXTENSION, MergeError, MergeTool, TrackKind, TrackResolver,
    TrackSpec, VideoStatus, VideoUnit, build_merge_cmd, format_merge_cmd, scan_units,
};

pub const STATUS_ALL_MERGED: &str = "All files merged!";
pub const STATUS_NO_VIDEOS: &str = "No video files found.";
pub const STATUS_STOPPED: &str = "Stopped by user.";

/// Receives notifications from a running batch.
///
/// Callbacks are notifications only; implementations must not call back into
/// the runner.
pub trait BatchObserver {
    fn on_status(&mut self, text: &str);

    /// Batch progress in percent, emitted once per processed video
    fn on_progress(&mut self, percent: u8);

    fn on_finished(&mut self);
}

/// Observer that drops everything
#[derive(Debug, Default)]
pub struct NullObserver;

impl BatchObserver for NullObserver {
    fn on_status(&mut self, _text: &str) {}
    fn on_progress(&mut self, _percent: u8) {}
    fn on_finished(&mut self) {}
}

/// Cooperative stop request shared between the worker and the foreground
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What the caller wants merged
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchRequest {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    #[serde(default)]
    pub audio: Vec<TrackSpec>,
    #[serde(default)]
    pub subtitles: Vec<TrackSpec>,
}

impl BatchRequest {
    pub fn new(source_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            audio: Vec::new(),
            subtitles: Vec::new(),
        }
    }

    pub fn with_audio(mut self, spec: TrackSpec) -> Self {
        self.audio.push(spec);
        self
    }

    pub fn with_subtitle(mut self, spec: TrackSpec) -> Self {
        self.subtitles.push(spec);
        self
    }

    /// Audio tracks first, then subtitles, each in the order given
    pub fn ordered_tracks(&self) -> Vec<(TrackSpec, TrackKind)> {
        self.audio
            .iter()
            .map(|s| (s.clone(), TrackKind::Audio))
            .chain(self.subtitles.iter().map(|s| (s.clone(), TrackKind::Subtitle)))
            .collect()
    }
}

/// Matching and naming rules for a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    pub video_extension: String,
    pub output_suffix: String,
    pub resolver: TrackResolver,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            video_extension: DEFAULT_VIDEO_EXTENSION.to_string(),
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            resolver: TrackResolver::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Locating,
    Scanning,
    Processing { index: usize, total: usize },
    Cancelling,
    Done,
}

/// How a batch ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every video was attempted
    Completed,
    /// The source directory held no videos
    NothingToDo,
    /// The merging tool could not be found; nothing was processed
    ToolMissing,
    /// Stopped by a cancellation request
    Stopped,
    /// The tool failed to launch; the rest of the batch was abandoned
    Halted,
    Critical(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoReport {
    pub base_name: String,
    pub status: VideoStatus,
    pub diagnostics: Vec<String>,
}

/// Summary handed back to the caller when a batch ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub outcome: BatchOutcome,
    pub videos: Vec<VideoReport>,
}

impl BatchReport {
    fn new(outcome: BatchOutcome) -> Self {
        Self {
            outcome,
            videos: Vec::new(),
        }
    }

    pub fn count(&self, status: VideoStatus) -> usize {
        self.videos.iter().filter(|v| v.status == status).count()
    }

    pub fn merged_count(&self) -> usize {
        self.videos.iter().filter(|v| v.status.is_merged()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.count(VideoStatus::Failed)
    }

    /// Completed (or had nothing to do) without any failed video
    pub fn is_success(&self) -> bool {
        matches!(
            self.outcome,
            BatchOutcome::Completed | BatchOutcome::NothingToDo
        ) && self.failed_count() == 0
    }
}

/// `round(completed / total * 100)`
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((completed as f64 / total as f64) * 100.0).round().min(100.0) as u8
}

/// Runs one batch. Consumed by [`BatchRunner::run`]; build a new runner for the next batch.
pub struct BatchRunner<T: MergeTool> {
    tool: T,
    request: BatchRequest,
    options: BatchOptions,
    cancel: CancelToken,
    state: BatchState,
}

impl<T: MergeTool> BatchRunner<T> {
    pub fn new(tool: T, request: BatchRequest, options: BatchOptions) -> Self {
        Self {
            tool,
            request,
            options,
            cancel: CancelToken::new(),
            state: BatchState::Idle,
        }
    }

    /// Share an existing token instead of the runner's own
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    /// Process the whole batch, reporting through `observer`.
    /// `on_finished` is always the last notification.
    pub fn run(mut self, observer: &mut dyn BatchObserver) -> BatchReport {
        let mut report = BatchReport::new(BatchOutcome::Completed);

        match self.process(observer, &mut report) {
            Ok(outcome) => report.outcome = outcome,
            Err(e) => {
                error!(error = %e, "Batch ended with a critical error");
                observer.on_status(&e.to_string());
                report.outcome = BatchOutcome::Critical(e.to_string());
            }
        }

        if report.outcome == BatchOutcome::Completed {
            let failed = report.failed_count();
            if failed == 0 {
                observer.on_status(STATUS_ALL_MERGED);
            } else {
                observer.on_status(&format!(
                    "Finished: {} merged, {} failed",
                    report.merged_count(),
                    failed
                ));
            }
        }

        self.transition(BatchState::Done);
        info!(outcome = ?report.outcome, merged = report.merged_count(), failed = report.failed_count(), "Batch done");
        observer.on_finished();
        report
    }

    fn transition(&mut self, next: BatchState) {
        debug!(from = ?self.state, to = ?next, "Batch state");
        self.state = next;
    }

    fn process(
        &mut self,
        observer: &mut dyn BatchObserver,
        report: &mut BatchReport,
    ) -> Result<BatchOutcome, MergeError> {
        self.transition(BatchState::Locating);
        let tool_path = match self.tool.locate() {
            Ok(path) => path,
            Err(e @ MergeError::ToolNotFound { .. }) => {
                error!(error = %e, "Merging tool not found");
                observer.on_status(&format!("Error: {}", e));
                return Ok(BatchOutcome::ToolMissing);
            }
            Err(e) => return Err(e),
        };

        self.transition(BatchState::Scanning);
        let units = scan_units(
            &self.request.source_dir,
            &self.request.output_dir,
            &self.options.video_extension,
            &self.options.output_suffix,
        )?;
        if units.is_empty() {
            info!(dir = %self.request.source_dir.display(), "No video files found");
            observer.on_status(STATUS_NO_VIDEOS);
            return Ok(BatchOutcome::NothingToDo);
        }

        fs::create_dir_all(&self.request.output_dir).map_err(|e| {
            MergeError::Critical(format!(
                "Failed to create output directory {}: {}",
                self.request.output_dir.display(),
                e
            ))
        })?;

        let tracks = self.request.ordered_tracks();
        let total = units.len();
        info!(videos = total, tracks = tracks.len(), tool = %tool_path.display(), "Starting batch");

        for (index, unit) in units.iter().enumerate() {
            if self.cancel.is_cancelled() {
                self.transition(BatchState::Cancelling);
                info!(remaining = total - index, "Batch stopped by user");
                skip_remaining(report, &units[index..]);
                observer.on_status(STATUS_STOPPED);
                return Ok(BatchOutcome::Stopped);
            }

            self.transition(BatchState::Processing { index, total });
            let halted = self.process_video(&tool_path, unit, &tracks, observer, report);
            if halted {
                skip_remaining(report, &units[index + 1..]);
                return Ok(BatchOutcome::Halted);
            }

            observer.on_progress(progress_percent(index + 1, total));
        }

        Ok(BatchOutcome::Completed)
    }

    /// Merge a single video. Returns true when the batch must halt.
    fn process_video(
        &self,
        tool_path: &std::path::Path,
        unit: &VideoUnit,
        tracks: &[(TrackSpec, TrackKind)],
        observer: &mut dyn BatchObserver,
        report: &mut BatchReport,
    ) -> bool {
        let built = build_merge_cmd(tool_path, unit, tracks, &self.options.resolver);
        let mut diagnostics = Vec::new();

        for warning in &built.warnings {
            warn!(video = %unit.base_name, kind = %warning.kind, dir = %warning.directory.display(), "Track not found");
            let text = warning.to_string();
            observer.on_status(&text);
            diagnostics.push(text);
        }

        observer.on_status(&format!("Merging: {}...", unit.base_name));
        debug!(cmd = %format_merge_cmd(&built.command), "Running merge");

        let (status, halted) = match self.tool.run(&built.command) {
            Ok(output) if output.success() => {
                info!(video = %unit.base_name, output = %unit.output_path.display(), attached = built.attached.len(), "Merged");
                observer.on_status(&format!("Successfully merged: {}", unit.base_name));
                if built.warnings.is_empty() {
                    (VideoStatus::Merged, false)
                } else {
                    (VideoStatus::MergedWithWarnings, false)
                }
            }
            Ok(output) => {
                // mkvmerge prints its own errors on stdout
                let diagnostic = if output.stderr.trim().is_empty() {
                    output.stdout
                } else {
                    output.stderr
                };
                let err = MergeError::MergeFailed {
                    video: unit.base_name.clone(),
                    code: output.code,
                    stderr: diagnostic.clone(),
                };
                error!(error = %err, "Merge failed");
                observer.on_status(&format!("Error merging {}:", unit.base_name));
                observer.on_status(&diagnostic);
                diagnostics.push(diagnostic);
                (VideoStatus::Failed, false)
            }
            Err(e) => {
                error!(video = %unit.base_name, error = %e, "Merging tool could not run");
                observer.on_status(&format!("Error: {}", e));
                diagnostics.push(e.to_string());
                (VideoStatus::Failed, e.is_fatal())
            }
        };

        report.videos.push(VideoReport {
            base_name: unit.base_name.clone(),
            status,
            diagnostics,
        });
        halted
    }
}

fn skip_remaining(report: &mut BatchReport, units: &[VideoUnit]) {
    report.videos.extend(units.iter().map(|u| VideoReport {
        base_name: u.base_name.clone(),
        status: VideoStatus::Skipped,
        diagnostics: Vec::new(),
    }));
}
