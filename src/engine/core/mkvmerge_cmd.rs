use super::error::MergeError;
use super::locate::ToolLocator;
use super::resolve::TrackResolver;
use super::types::{MergeOutput, TrackKind, TrackSpec, TrackWarning, VideoUnit};
use std::ffi::{OsStr, OsString};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::trace;

pub const OUTPUT_FLAG: &str = "-o";
pub const LANGUAGE_FLAG: &str = "--language";
pub const TRACK_NAME_FLAG: &str = "--track-name";

/// Every external file carries exactly one track, so options address track 0
const TRACK_ID: u32 = 0;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Create a command that never opens a console window on Windows
pub fn new_command(program: impl AsRef<OsStr>) -> Command {
    #[allow(unused_mut)]
    let mut cmd = Command::new(program);
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
    cmd
}

/// A fully assembled merging-tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl MergeCommand {
    /// Program followed by its arguments
    pub fn argv(&self) -> Vec<OsString> {
        std::iter::once(self.program.clone().into_os_string())
            .chain(self.args.iter().cloned())
            .collect()
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = new_command(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

/// A track that was found and added to the command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedTrack {
    pub kind: TrackKind,
    pub path: PathBuf,
    pub language_code: String,
    pub display_name: String,
}

/// Result of building the command for one video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltCommand {
    pub command: MergeCommand,
    pub attached: Vec<AttachedTrack>,
    pub warnings: Vec<TrackWarning>,
}

/// Build the merge invocation for one video:
/// `<tool> -o <output> <input> [--language 0:<code> --track-name 0:<name> <track>]*`
///
/// Tracks are appended in the order given. A track with no matching file adds
/// nothing and produces a warning instead.
pub fn build_merge_cmd(
    tool: &Path,
    video: &VideoUnit,
    tracks: &[(TrackSpec, TrackKind)],
    resolver: &TrackResolver,
) -> BuiltCommand {
    let mut args: Vec<OsString> = vec![
        OUTPUT_FLAG.into(),
        video.output_path.clone().into_os_string(),
        video.source_path.clone().into_os_string(),
    ];
    let mut attached = Vec::new();
    let mut warnings = Vec::new();

    for (spec, kind) in tracks {
        match resolver.resolve(*kind, &video.base_name, &spec.source_directory) {
            Some(path) => {
                args.push(LANGUAGE_FLAG.into());
                args.push(format!("{}:{}", TRACK_ID, spec.language_code).into());
                args.push(TRACK_NAME_FLAG.into());
                args.push(format!("{}:{}", TRACK_ID, spec.display_name).into());
                args.push(path.clone().into_os_string());
                attached.push(AttachedTrack {
                    kind: *kind,
                    path,
                    language_code: spec.language_code.clone(),
                    display_name: spec.display_name.clone(),
                });
            }
            None => warnings.push(TrackWarning {
                kind: *kind,
                base_name: video.base_name.clone(),
                directory: spec.source_directory.clone(),
            }),
        }
    }

    BuiltCommand {
        command: MergeCommand {
            program: tool.to_path_buf(),
            args,
        },
        attached,
        warnings,
    }
}

/// Format a command as a shell-safe string for display
pub fn format_merge_cmd(command: &MergeCommand) -> String {
    let parts: Vec<String> = command
        .argv()
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    shlex::try_join(parts.iter().map(String::as_str)).unwrap_or_else(|_| parts.join(" "))
}

/// Run a command to completion, draining stdout and stderr concurrently.
///
/// An `Err` means the process could not be started or waited on; a non-zero
/// exit is reported through `MergeOutput::code`.
pub fn run_merge_cmd(command: &MergeCommand) -> Result<MergeOutput, MergeError> {
    let launch_failed = |source| MergeError::ToolLaunchFailed {
        tool: command.program.clone(),
        source,
    };

    let mut cmd = command.to_command();
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(launch_failed)?;

    let stderr = child.stderr.take();
    let stderr_thread = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut stderr) = stderr {
            stderr.read_to_end(&mut buf).ok();
        }
        String::from_utf8_lossy(&buf).into_owned()
    });

    let mut stdout_output = String::new();
    if let Some(stdout) = child.stdout.take() {
        for line in BufReader::new(stdout).split(b'\n').map_while(Result::ok) {
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches('\r');
            trace!(target: "trackmux::tool", "{}", line);
            stdout_output.push_str(line);
            stdout_output.push('\n');
        }
    }

    let status = child.wait().map_err(launch_failed)?;
    let stderr_output = stderr_thread
        .join()
        .unwrap_or_else(|_| "Failed to capture stderr".to_string());

    Ok(MergeOutput {
        code: status.code(),
        stdout: stdout_output,
        stderr: stderr_output,
    })
}

/// The external merging tool as seen by the batch runner
pub trait MergeTool: Send {
    /// Find the executable, once per batch
    fn locate(&self) -> Result<PathBuf, MergeError>;

    /// Execute one invocation synchronously
    fn run(&self, command: &MergeCommand) -> Result<MergeOutput, MergeError>;
}

/// mkvmerge found through a [`ToolLocator`]
#[derive(Debug, Clone)]
pub struct Mkvmerge {
    locator: ToolLocator,
}

impl Mkvmerge {
    pub fn new(locator: ToolLocator) -> Self {
        Self { locator }
    }
}

impl MergeTool for Mkvmerge {
    fn locate(&self) -> Result<PathBuf, MergeError> {
        self.locator.locate()
    }

    fn run(&self, command: &MergeCommand) -> Result<MergeOutput, MergeError> {
        run_merge_cmd(command)
    }
}
