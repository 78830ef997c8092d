use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use trackmux::engine::{BatchObserver, BatchRequest, TrackSpec};

/// Create an empty file (and its parent directory)
pub fn touch(dir: &Path, name: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, b"fake media").unwrap();
    path
}

/// A season folder layout: videos, one audio folder, one subtitle folder, output
pub struct Season {
    pub temp: TempDir,
    pub source: PathBuf,
    pub audio: PathBuf,
    pub subs: PathBuf,
    pub output: PathBuf,
}

impl Season {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        let season = Self {
            source: root.join("videos"),
            audio: root.join("audio"),
            subs: root.join("subs"),
            output: root.join("out"),
            temp,
        };
        fs::create_dir_all(&season.source).unwrap();
        fs::create_dir_all(&season.audio).unwrap();
        fs::create_dir_all(&season.subs).unwrap();
        season
    }

    pub fn video(&self, name: &str) -> PathBuf {
        touch(&self.source, name)
    }

    /// Request with one Russian audio track and one English subtitle track
    pub fn request(&self) -> BatchRequest {
        BatchRequest::new(&self.source, &self.output)
            .with_audio(TrackSpec::new(&self.audio, "ru", "AniLibria"))
            .with_subtitle(TrackSpec::new(&self.subs, "en", "Full"))
    }
}

/// Observer that keeps every notification
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub statuses: Vec<String>,
    pub progress: Vec<u8>,
    pub finished: usize,
}

impl RecordingObserver {
    pub fn has_status(&self, needle: &str) -> bool {
        self.statuses.iter().any(|s| s.contains(needle))
    }

    pub fn last_status(&self) -> Option<&str> {
        self.statuses.last().map(String::as_str)
    }
}

impl BatchObserver for RecordingObserver {
    fn on_status(&mut self, text: &str) {
        self.statuses.push(text.to_string());
    }

    fn on_progress(&mut self, percent: u8) {
        self.progress.push(percent);
    }

    fn on_finished(&mut self) {
        self.finished += 1;
    }
}

/// Command arguments as plain strings
pub fn args_of(command: &trackmux::engine::MergeCommand) -> Vec<String> {
    command
        .args
        .iter()
        .map(|a| a.to_string_lossy().to_string())
        .collect()
}
