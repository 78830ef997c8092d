use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use trackmux::engine::{MergeCommand, MergeError, MergeOutput, MergeTool};

type RunHook = Arc<dyn Fn(&MergeCommand) + Send + Sync>;

/// Stand-in for mkvmerge that records every invocation
#[derive(Clone, Default)]
pub struct FakeTool {
    missing: bool,
    failures: HashMap<String, String>,
    launch_failure_on: Option<String>,
    on_run: Option<RunHook>,
    invocations: Arc<Mutex<Vec<MergeCommand>>>,
}

impl FakeTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// `locate` reports ToolNotFound
    pub fn missing() -> Self {
        Self {
            missing: true,
            ..Self::default()
        }
    }

    /// Exit with code 2 and this stderr for the video with `base_name`
    pub fn failing_on(mut self, base_name: &str, stderr: &str) -> Self {
        self.failures
            .insert(base_name.to_string(), stderr.to_string());
        self
    }

    /// Fail to spawn for the video with `base_name`
    pub fn launch_failure_on(mut self, base_name: &str) -> Self {
        self.launch_failure_on = Some(base_name.to_string());
        self
    }

    /// Called at the start of every run
    pub fn on_run(mut self, hook: impl Fn(&MergeCommand) + Send + Sync + 'static) -> Self {
        self.on_run = Some(Arc::new(hook));
        self
    }

    /// Shared handle to the recorded invocations
    pub fn invocations(&self) -> Arc<Mutex<Vec<MergeCommand>>> {
        self.invocations.clone()
    }
}

/// Base name of the input video (third argument: `-o <out> <input>`)
pub fn input_base_name(command: &MergeCommand) -> String {
    command
        .args
        .get(2)
        .and_then(|a| Path::new(a).file_stem().map(|s| s.to_string_lossy().to_string()))
        .unwrap_or_default()
}

impl MergeTool for FakeTool {
    fn locate(&self) -> Result<PathBuf, MergeError> {
        if self.missing {
            return Err(MergeError::ToolNotFound {
                tool: "mkvmerge".to_string(),
                searched: vec![PathBuf::from("/nowhere/mkvmerge")],
            });
        }
        Ok(PathBuf::from("/fake/bin/mkvmerge"))
    }

    fn run(&self, command: &MergeCommand) -> Result<MergeOutput, MergeError> {
        if let Some(hook) = &self.on_run {
            hook(command);
        }
        self.invocations.lock().unwrap().push(command.clone());

        let base = input_base_name(command);
        if self.launch_failure_on.as_deref() == Some(base.as_str()) {
            return Err(MergeError::ToolLaunchFailed {
                tool: command.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            });
        }

        match self.failures.get(&base) {
            Some(stderr) => Ok(MergeOutput {
                code: Some(2),
                stdout: String::new(),
                stderr: stderr.clone(),
            }),
            None => Ok(MergeOutput {
                code: Some(0),
                stdout: "Multiplexing took 1 second.\n".to_string(),
                stderr: String::new(),
            }),
        }
    }
}
