mod error;
mod locate;
mod mkvmerge_cmd;
mod resolve;
mod scan;
mod types;

pub use error::MergeError;
pub use locate::{DEFAULT_TOOL_NAME, ToolLocator, executable_name, tool_version};
pub use mkvmerge_cmd::{
    AttachedTrack, BuiltCommand, LANGUAGE_FLAG, MergeCommand, MergeTool, Mkvmerge, OUTPUT_FLAG,
    TRACK_NAME_FLAG, build_merge_cmd, format_merge_cmd, new_command, run_merge_cmd,
};
pub use resolve::{
    DEFAULT_AUDIO_EXTENSIONS, DEFAULT_SUBTITLE_EXTENSIONS, TrackResolver, resolve,
};
pub use scan::{DEFAULT_OUTPUT_SUFFIX, DEFAULT_VIDEO_EXTENSION, has_extension, scan, scan_units};
pub use types::{MergeOutput, TrackKind, TrackSpec, TrackWarning, VideoStatus, VideoUnit};
