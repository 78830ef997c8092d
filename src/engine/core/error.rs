use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the merge engine
#[derive(Debug, Error)]
pub enum MergeError {
    #[error(
        "{tool} not found. Make sure it's installed and in your PATH or Program Files, or bundled correctly"
    )]
    ToolNotFound {
        tool: String,
        searched: Vec<PathBuf>,
    },

    #[error("Failed to launch {}: {source}", .tool.display())]
    ToolLaunchFailed {
        tool: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error merging {video} (exit code {}):\n{stderr}", .code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    MergeFailed {
        video: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Failed to read directory {}: {source}", .path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Critical error occurred: {0}")]
    Critical(String),
}

impl MergeError {
    /// Whether this error ends the remainder of the batch
    pub fn is_fatal(&self) -> bool {
        !matches!(self, MergeError::MergeFailed { .. })
    }
}
