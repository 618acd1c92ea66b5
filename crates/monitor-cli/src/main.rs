//! Fatigue Replay - Main Entry Point

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fatigue_monitor::LiveMetrics;
use monitor_cli::{init_logging, load_config, replay, replay_threaded, Replayer};
use storage::SummaryRepository;
use tracing::{info, Level};

/// Replay a recorded face-landmark stream through a fatigue monitoring session
#[derive(Parser)]
#[command(name = "fatigue-replay")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Recorded stream, one JSON record per line (use - for stdin)
    input: PathBuf,

    /// TOML configuration file (overridden by FATIGUE__* variables)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subjective sleepiness reported at the end of the session (1-9)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=9))]
    sleepiness: Option<u8>,

    /// Replay at recorded speed with a separate reader thread
    #[arg(long)]
    threaded: bool,

    /// Print live metrics for every processed frame as JSON lines
    #[arg(long)]
    live: bool,

    /// Write all stored checkpoints to this file as JSON
    #[arg(long)]
    export: Option<PathBuf>,

    /// Maximum log level
    #[arg(long, default_value = "info")]
    log_level: Level,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level, cli.log_json)?;

    info!("=== Fatigue Replay v{} ===", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_deref()).context("loading configuration")?;
    let repository = SummaryRepository::new();
    let replayer = Replayer::new(config, &repository)?;

    let reader: Box<dyn BufRead + Send> = if cli.input.as_os_str() == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(&cli.input)
            .with_context(|| format!("opening {}", cli.input.display()))?;
        Box::new(BufReader::new(file))
    };

    let stdout = io::stdout();
    let live = cli.live;
    let on_live = |metrics: &LiveMetrics| {
        if live {
            if let Ok(line) = serde_json::to_string(metrics) {
                let _ = writeln!(stdout.lock(), "{}", line);
            }
        }
    };

    let outcome = if cli.threaded {
        replay_threaded(reader, replayer, cli.sleepiness, on_live)?
    } else {
        replay(reader, replayer, cli.sleepiness, on_live)?
    };

    info!(
        "Session {}: {} frames ({} without face, {} dropped), {} controls, {} checkpoints, {} alerts",
        outcome.session_id,
        outcome.stats.frames,
        outcome.stats.no_face,
        outcome.stats.dropped,
        outcome.stats.controls,
        outcome.stats.checkpoints,
        outcome.stats.alerts.len()
    );

    println!("{}", serde_json::to_string_pretty(&outcome.summary.to_report())?);

    if let Some(path) = cli.export {
        fs::write(&path, repository.export_json()?)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("Exported {} checkpoints to {}", repository.len(), path.display());
    }

    Ok(())
}
