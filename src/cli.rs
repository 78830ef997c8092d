use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "trackmux")]
#[command(
    about = "Attach external audio and subtitle tracks to a folder of episodes with mkvmerge",
    version,
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge every video in SOURCE with its matching tracks into OUTPUT
    Merge {
        #[command(flatten)]
        batch: BatchArgs,

        /// Print one JSON object per status/progress notification
        #[arg(long)]
        json: bool,
    },

    /// Show the mkvmerge commands without executing them
    DryRun {
        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Check that the merging tool can be found and runs
    CheckTool,

    /// Show config status and location, or create default config if missing
    InitConfig,
}

#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Directory containing the episode videos
    #[arg(value_name = "SOURCE", required_unless_present = "batch")]
    pub source: Option<PathBuf>,

    /// Directory the merged files are written to
    #[arg(value_name = "OUTPUT", required_unless_present = "batch")]
    pub output: Option<PathBuf>,

    /// Attach an audio track from DIR (repeatable, order is kept)
    #[arg(
        long = "audio",
        num_args = 3,
        value_names = ["LANG", "NAME", "DIR"],
        action = ArgAction::Append
    )]
    pub audio: Vec<String>,

    /// Attach a subtitle track from DIR (repeatable, order is kept)
    #[arg(
        long = "subtitle",
        num_args = 3,
        value_names = ["LANG", "NAME", "DIR"],
        action = ArgAction::Append
    )]
    pub subtitle: Vec<String>,

    /// Read the batch (directories and tracks) from a TOML file
    #[arg(long, value_name = "FILE", conflicts_with_all = ["source", "output"])]
    pub batch: Option<PathBuf>,
}

pub fn parse() -> Cli {
    Cli::parse()
}
