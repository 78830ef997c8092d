use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of external track attached to a video
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Subtitle,
}

impl TrackKind {
    pub fn label(self) -> &'static str {
        match self {
            TrackKind::Audio => "audio",
            TrackKind::Subtitle => "subtitle",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One audio or subtitle source the user wants attached to every video
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackSpec {
    #[serde(rename = "path")]
    pub source_directory: PathBuf,
    #[serde(rename = "language")]
    pub language_code: String,
    #[serde(rename = "track_name", default)]
    pub display_name: String,
}

impl TrackSpec {
    pub fn new(
        source_directory: impl Into<PathBuf>,
        language_code: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            source_directory: source_directory.into(),
            language_code: language_code.into(),
            display_name: display_name.into(),
        }
    }
}

/// A discovered video file and where its merged output goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoUnit {
    pub base_name: String,
    pub source_path: PathBuf,
    pub output_path: PathBuf,
}

impl VideoUnit {
    /// Derive a unit from a source file: `<output_dir>/<stem><suffix>.mkv`
    ///
    /// A stem that is not valid UTF-8 gets a lossy `base_name` for matching and
    /// messages, while both paths keep the original bytes.
    pub fn from_source(source_path: PathBuf, output_dir: &Path, suffix: &str) -> Option<Self> {
        let stem = source_path.file_stem()?.to_os_string();
        let base_name = stem.to_string_lossy().into_owned();
        let mut file_name = stem;
        file_name.push(suffix);
        file_name.push(".mkv");
        let output_path = output_dir.join(file_name);
        Some(Self {
            base_name,
            source_path,
            output_path,
        })
    }
}

/// Terminal status of a single video
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum VideoStatus {
    Merged,
    MergedWithWarnings,
    Failed,
    Skipped,
}

impl VideoStatus {
    pub fn is_merged(self) -> bool {
        matches!(self, VideoStatus::Merged | VideoStatus::MergedWithWarnings)
    }
}

/// A track that had no matching file for a given video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackWarning {
    pub kind: TrackKind,
    pub base_name: String,
    pub directory: PathBuf,
}

impl fmt::Display for TrackWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Warning: No {} file found for {} in {}",
            self.kind,
            self.base_name,
            self.directory.display()
        )
    }
}

/// Captured result of one merging-tool invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl MergeOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}
