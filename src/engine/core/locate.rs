use super::error::MergeError;
use super::mkvmerge_cmd::new_command;
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default merging tool from MKVToolNix
pub const DEFAULT_TOOL_NAME: &str = "mkvmerge";

/// Sub-directories under Program Files style roots that MKVToolNix installs into
const INSTALL_SUBDIRS: &[&str] = &["MKVToolNix", "MKVToolNix GUI"];

/// Environment variables naming Program Files style roots (Windows)
const PROGRAM_FILES_VARS: &[&str] = &["ProgramFiles", "ProgramFiles(x86)", "ProgramW6432"];

/// Conventional install directories on unix-like systems
const UNIX_INSTALL_DIRS: &[&str] = &[
    "/usr/bin",
    "/usr/local/bin",
    "/opt/homebrew/bin",
    "/opt/local/bin",
];

/// Platform file name for a program (`mkvmerge` -> `mkvmerge.exe` on Windows)
pub fn executable_name(program: &str) -> String {
    let suffix = std::env::consts::EXE_SUFFIX;
    if suffix.is_empty() || program.ends_with(suffix) {
        program.to_string()
    } else {
        format!("{}{}", program, suffix)
    }
}

/// Finds the merging executable.
///
/// Search order, first hit wins:
/// 1. an explicitly configured path
/// 2. bundle directories next to the running program
/// 3. the executable search path (`PATH`)
/// 4. conventional install directories
#[derive(Debug, Clone)]
pub struct ToolLocator {
    program: String,
    explicit: Option<PathBuf>,
    bundle_dirs: Vec<PathBuf>,
    use_search_path: bool,
    search_path: Option<OsString>,
    install_dirs: Vec<PathBuf>,
}

impl ToolLocator {
    /// A locator with no candidate locations besides `PATH`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            explicit: None,
            bundle_dirs: Vec::new(),
            use_search_path: true,
            search_path: None,
            install_dirs: Vec::new(),
        }
    }

    /// A locator populated from the running program and the environment
    pub fn system(program: impl Into<String>, explicit: Option<PathBuf>) -> Self {
        let mut locator = Self::new(program);
        locator.explicit = explicit;
        locator.bundle_dirs = bundled_dirs();
        locator.install_dirs = install_dirs();
        locator
    }

    pub fn with_explicit(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }

    pub fn with_bundle_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.bundle_dirs.push(dir.into());
        self
    }

    pub fn with_install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_dirs.push(dir.into());
        self
    }

    /// Search this `PATH`-style list instead of the process environment
    pub fn with_search_path(mut self, paths: impl Into<OsString>) -> Self {
        self.search_path = Some(paths.into());
        self
    }

    pub fn without_search_path(mut self) -> Self {
        self.use_search_path = false;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run the search. `ToolNotFound` lists every fixed location that was tried.
    pub fn locate(&self) -> Result<PathBuf, MergeError> {
        let file_name = executable_name(&self.program);
        let mut searched = Vec::new();

        if let Some(explicit) = &self.explicit {
            if explicit.is_file() {
                info!(path = %explicit.display(), "Using configured {}", self.program);
                return Ok(explicit.clone());
            }
            debug!(path = %explicit.display(), "Configured tool path does not exist");
            searched.push(explicit.clone());
        }

        for dir in &self.bundle_dirs {
            let candidate = dir.join(&file_name);
            if candidate.is_file() {
                info!(path = %candidate.display(), "Using bundled {}", self.program);
                return Ok(candidate);
            }
            searched.push(candidate);
        }

        if self.use_search_path {
            if let Some(found) = self.search_path_lookup() {
                info!(path = %found.display(), "Using PATH {}", self.program);
                return Ok(found);
            }
        }

        for dir in &self.install_dirs {
            let candidate = dir.join(&file_name);
            if candidate.is_file() {
                info!(path = %candidate.display(), "Using installed {}", self.program);
                return Ok(candidate);
            }
            searched.push(candidate);
        }

        debug!(program = %self.program, candidates = searched.len(), "Merging tool not found");
        Err(MergeError::ToolNotFound {
            tool: self.program.clone(),
            searched,
        })
    }

    fn search_path_lookup(&self) -> Option<PathBuf> {
        let found = match &self.search_path {
            Some(paths) => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                which::which_in(&self.program, Some(paths), cwd).ok()
            }
            None => which::which(&self.program).ok(),
        };
        found.filter(|p| p.is_file())
    }
}

/// Directories a packaged build ships the tool in, relative to the running program
fn bundled_dirs() -> Vec<PathBuf> {
    let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    else {
        return Vec::new();
    };

    let mut dirs = vec![exe_dir.join("mkvtoolnix")];
    if cfg!(target_os = "macos") {
        dirs.push(exe_dir.join("binary").join("macos"));
        // Contents/MacOS/<exe> -> Contents/Resources/binary/macos
        dirs.push(exe_dir.join("..").join("Resources").join("binary").join("macos"));
    }
    dirs
}

fn install_dirs() -> Vec<PathBuf> {
    if cfg!(target_os = "windows") {
        let roots = PROGRAM_FILES_VARS
            .iter()
            .filter_map(|var| std::env::var_os(var))
            .map(PathBuf::from);
        program_files_dirs(roots)
    } else {
        UNIX_INSTALL_DIRS.iter().map(PathBuf::from).collect()
    }
}

/// Expand Program Files style roots into MKVToolNix install directories, dropping duplicates
fn program_files_dirs(roots: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    for root in roots {
        for sub in INSTALL_SUBDIRS {
            let dir = root.join(sub);
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
    }
    dirs
}

/// Check that the tool runs and return the first line of its `--version` output
pub fn tool_version(tool: &Path) -> Result<String> {
    let output = new_command(tool)
        .arg("--version")
        .output()
        .with_context(|| format!("Failed to execute {}", tool.display()))?;

    if !output.status.success() {
        anyhow::bail!(
            "{} --version failed with status: {}",
            tool.display(),
            output.status
        );
    }

    let version_output = String::from_utf8_lossy(&output.stdout);
    let first_line = version_output.lines().next().unwrap_or("Unknown version");

    Ok(first_line.to_string())
}
