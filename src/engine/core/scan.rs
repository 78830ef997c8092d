use super::error::MergeError;
use super::types::VideoUnit;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Default extension of source videos
pub const DEFAULT_VIDEO_EXTENSION: &str = "mkv";

/// Default suffix appended to the base name of merged outputs
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_merged";

/// Check if a path carries the given extension (case-insensitive)
pub fn has_extension(path: &Path, extension: &str) -> bool {
    let extension = extension.trim_start_matches('.');
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// List video files directly inside `root` (no recursion), sorted by file name
pub fn scan(root: &Path, extension: &str) -> Result<Vec<PathBuf>, MergeError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| MergeError::Scan {
            path: root.to_path_buf(),
            source: e.into(),
        })?;
        let path = entry.path();
        if path.is_file() && has_extension(path, extension) {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

/// Snapshot the source directory into the units of one batch
pub fn scan_units(
    source_dir: &Path,
    output_dir: &Path,
    extension: &str,
    suffix: &str,
) -> Result<Vec<VideoUnit>, MergeError> {
    Ok(scan(source_dir, extension)?
        .into_iter()
        .filter_map(|path| VideoUnit::from_source(path, output_dir, suffix))
        .collect())
}
