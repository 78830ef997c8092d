use crate::cli::{BatchArgs, Cli, Commands};
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;
use std::process;
use trackmux::config::Config;
use trackmux::engine::{
    self, BatchMessage, BatchOutcome, BatchReport, BatchRequest, BatchRunner, BatchWorker,
    MergeError, Mkvmerge, TrackSpec, VideoStatus,
};
use trackmux::logging;

pub fn run(cli: Cli) {
    let config = load_config(cli.config.as_deref());
    logging::init_logging(&config.logging, cli.verbose);

    match cli.command {
        Commands::Merge { batch, json } => handle_merge(&config, batch, json),
        Commands::DryRun { batch } => handle_dry_run(&config, batch),
        Commands::CheckTool => handle_check_tool(&config),
        Commands::InitConfig => handle_init_config(),
    }
}

fn load_config(path: Option<&Path>) -> Config {
    match path {
        Some(path) => Config::load_from(path).unwrap_or_else(|e| {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }),
        None => Config::load().unwrap_or_else(|e| {
            eprintln!("Warning: {:#}", e);
            eprintln!("Using built-in defaults.");
            Config::default()
        }),
    }
}

/// Turn CLI arguments (and an optional batch file) into a request
fn build_request(args: BatchArgs) -> Result<BatchRequest> {
    let mut request = match &args.batch {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read batch file: {}", path.display()))?;
            toml::from_str::<BatchRequest>(&contents)
                .with_context(|| format!("Failed to parse batch file: {}", path.display()))?
        }
        None => match (args.source, args.output) {
            (Some(source), Some(output)) => BatchRequest::new(source, output),
            _ => bail!("SOURCE and OUTPUT directories are required without --batch"),
        },
    };

    request.audio.extend(track_specs(&args.audio));
    request.subtitles.extend(track_specs(&args.subtitle));
    Ok(request)
}

/// `[LANG, NAME, DIR]*` -> specs, in the order given
fn track_specs(values: &[String]) -> Vec<TrackSpec> {
    values
        .chunks_exact(3)
        .map(|chunk| TrackSpec::new(&chunk[2], &chunk[0], &chunk[1]))
        .collect()
}

fn request_or_exit(args: BatchArgs) -> BatchRequest {
    match build_request(args) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn handle_merge(config: &Config, args: BatchArgs, json: bool) {
    let request = request_or_exit(args);

    if let Err(errors) = engine::validate_request(&request) {
        for error in &errors {
            eprintln!("Error: {}", error.message);
        }
        process::exit(1);
    }

    let runner = BatchRunner::new(
        Mkvmerge::new(config.tool_locator()),
        request,
        config.batch_options(),
    );
    let worker = BatchWorker::spawn(runner);

    let cancel = worker.cancel_token();
    if let Err(e) = ctrlc::set_handler(move || {
        if cancel.is_cancelled() {
            // Second Ctrl+C - force exit
            process::exit(130);
        }
        eprintln!("\nReceived Ctrl+C, finishing current file...");
        cancel.cancel();
    }) {
        tracing::warn!(error = %e, "Could not install Ctrl+C handler");
    }

    for message in worker.receiver().iter() {
        if json {
            match serde_json::to_string(&message) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::error!(error = %e, "Failed to serialize message"),
            }
            continue;
        }
        match message {
            BatchMessage::Status { text } => println!("{}", text.trim_end()),
            BatchMessage::Progress { percent } => println!("Progress: {}%", percent),
            BatchMessage::Finished => {}
        }
    }

    let report = worker.join();
    if !json {
        print_summary(&report);
    }
    process::exit(if report.is_success() { 0 } else { 1 });
}

fn print_summary(report: &BatchReport) {
    if report.videos.is_empty() {
        return;
    }
    println!();
    for video in &report.videos {
        let label = match video.status {
            VideoStatus::Merged => "merged",
            VideoStatus::MergedWithWarnings => "merged (warnings)",
            VideoStatus::Failed => "FAILED",
            VideoStatus::Skipped => "skipped",
        };
        println!("- {:<18} {}", label, video.base_name);
    }
    if let BatchOutcome::Critical(message) = &report.outcome {
        eprintln!("Critical error: {}", message);
    }
}

fn handle_dry_run(config: &Config, args: BatchArgs) {
    let request = request_or_exit(args);
    let options = config.batch_options();

    let tool = match config.tool_locator().locate() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Warning: {}", e);
            Path::new(&config.tool.name).to_path_buf()
        }
    };

    println!(
        "Dry run: building {} commands for {}",
        config.tool.name,
        request.source_dir.display()
    );

    let units = match engine::scan_units(
        &request.source_dir,
        &request.output_dir,
        &options.video_extension,
        &options.output_suffix,
    ) {
        Ok(units) => units,
        Err(e) => {
            eprintln!("Error scanning directory: {}", e);
            process::exit(1);
        }
    };
    if units.is_empty() {
        println!("{}", engine::batch::STATUS_NO_VIDEOS);
        return;
    }

    let tracks = request.ordered_tracks();
    for unit in &units {
        let built = engine::build_merge_cmd(&tool, unit, &tracks, &options.resolver);
        for warning in &built.warnings {
            eprintln!("{}", warning);
        }
        println!("{}", engine::format_merge_cmd(&built.command));
    }
}

fn handle_check_tool(config: &Config) {
    match config.tool_locator().locate() {
        Ok(path) => {
            println!("{} found: {}", config.tool.name, path.display());
            match engine::tool_version(&path) {
                Ok(version) => {
                    println!("{}", version);
                    process::exit(0);
                }
                Err(e) => {
                    eprintln!("Error: {:#}", e);
                    process::exit(1);
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            if let MergeError::ToolNotFound { searched, .. } = &e {
                for candidate in searched {
                    eprintln!("  checked {}", candidate.display());
                }
            }
            process::exit(1);
        }
    }
}

fn handle_init_config() {
    let path = match Config::config_path() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    };

    if Config::exists() {
        match Config::load() {
            Ok(cfg) => {
                println!("Config loaded successfully from {}", path.display());
                println!("{:#?}", cfg);
            }
            Err(e) => {
                eprintln!("Config invalid: {:#}", e);
                process::exit(1);
            }
        }
        return;
    }

    println!("Creating default config...");
    if let Err(e) = Config::default().save() {
        eprintln!("Failed to save default config: {:#}", e);
        process::exit(1);
    }
    println!("Default config saved to {}", path.display());
}
