//! CI Trace Viewer - Entry Point

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// CI Trace Viewer - TUI for viewing CI job trace logs
#[derive(Parser, Debug)]
#[command(name = "citv")]
#[command(version)]
#[command(about = "TUI application for viewing CI job trace logs")]
pub struct Args {
    /// Path to the trace file (reads from stdin if not provided)
    pub file: Option<PathBuf>,

    /// Re-read and re-parse the trace on an interval (like tail -f)
    #[arg(short, long)]
    pub follow: bool,

    /// Follow-mode poll interval in milliseconds
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Disable colors
    #[arg(long)]
    pub no_color: bool,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Set NO_COLOR env var if --no-color flag is passed, so color handling
    // is consistent everywhere.
    if args.no_color {
        std::env::set_var("NO_COLOR", "1");
    }

    // Resolve configuration with full precedence chain:
    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        let config_file = citv::config::load_config_with_precedence(args.config.clone())?;
        let merged = citv::config::merge_config(config_file);
        let with_env = citv::config::apply_env_overrides(merged);

        let follow_override = if args.follow { Some(true) } else { None };
        citv::config::apply_cli_overrides(with_env, follow_override, args.poll_interval)
    };

    citv::logging::init(&config.log_file)?;
    info!(config = ?config, "Configuration loaded and resolved");

    let source = citv::source::detect_input_source(args.file.clone())?;

    let options = citv::view::ViewerOptions {
        follow: config.follow && source.is_followable(),
        poll_interval: Duration::from_millis(config.poll_interval_ms),
        color: citv::view::ColorConfig::from_env_and_args(args.no_color),
    };

    citv::view::run_with_source(source, options)?;

    Ok(())
}
