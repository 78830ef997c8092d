use super::types::TrackKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Audio container/stream extensions, in match priority order
pub const DEFAULT_AUDIO_EXTENSIONS: &[&str] = &["mka", "aac", "mp3", "ac3", "dts", "flac", "ogg", "wav"];

/// Subtitle extensions, in match priority order
pub const DEFAULT_SUBTITLE_EXTENSIONS: &[&str] = &["srt", "ass", "ssa", "vtt"];

/// Find the track file for `base_name` in `directory`.
///
/// A file matches when its name starts with `base_name` (case-sensitive, no
/// pattern characters) followed by a non-alphanumeric character, and its
/// extension is in `allowed_extensions`. `ep1` claims `ep1.srt` and
/// `ep1 [eng].srt` but never `ep10.srt`. Extensions
/// are tried in order and the first one with any match wins. Among several
/// matches for the same extension an exact `<base_name>.<ext>` is preferred,
/// then the lexicographically smallest file name.
///
/// A missing, empty or unreadable directory is the same as no match.
pub fn resolve<S: AsRef<str>>(
    base_name: &str,
    directory: &Path,
    allowed_extensions: &[S],
) -> Option<PathBuf> {
    if directory.as_os_str().is_empty() || !directory.is_dir() {
        return None;
    }

    let entries = match std::fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %directory.display(), error = %e, "Could not list track directory");
            return None;
        }
    };

    // (file name, extension) for every file carrying the prefix
    let mut candidates: Vec<(String, String)> = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !has_base_prefix(name, base_name) {
            continue;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        candidates.push((name.to_string(), ext.to_string()));
    }

    for allowed in allowed_extensions {
        let allowed = allowed.as_ref().trim_start_matches('.');
        let exact = format!("{}.{}", base_name, allowed);

        let best = candidates
            .iter()
            .filter(|(_, ext)| ext.eq_ignore_ascii_case(allowed))
            .map(|(name, _)| name)
            .min_by(|a, b| {
                let a_exact = a.eq_ignore_ascii_case(&exact);
                let b_exact = b.eq_ignore_ascii_case(&exact);
                b_exact.cmp(&a_exact).then_with(|| a.cmp(b))
            });

        if let Some(name) = best {
            return Some(directory.join(name));
        }
    }

    None
}

/// `name` starts with `base_name` and the prefix ends on a separator
fn has_base_prefix(name: &str, base_name: &str) -> bool {
    name.strip_prefix(base_name)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| !c.is_alphanumeric())
}

/// Extension sets per track kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackResolver {
    pub audio_extensions: Vec<String>,
    pub subtitle_extensions: Vec<String>,
}

impl Default for TrackResolver {
    fn default() -> Self {
        Self {
            audio_extensions: DEFAULT_AUDIO_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            subtitle_extensions: DEFAULT_SUBTITLE_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl TrackResolver {
    pub fn new(audio_extensions: Vec<String>, subtitle_extensions: Vec<String>) -> Self {
        Self {
            audio_extensions,
            subtitle_extensions,
        }
    }

    pub fn extensions(&self, kind: TrackKind) -> &[String] {
        match kind {
            TrackKind::Audio => &self.audio_extensions,
            TrackKind::Subtitle => &self.subtitle_extensions,
        }
    }

    pub fn resolve(&self, kind: TrackKind, base_name: &str, directory: &Path) -> Option<PathBuf> {
        resolve(base_name, directory, self.extensions(kind))
    }
}
