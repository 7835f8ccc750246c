use clap::Parser;
use comet_impact_rust::animation::OutputStrategy;
use comet_impact_rust::config::SimConfig;
use comet_impact_rust::Result;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Animate heat diffusion after a comet impact on a layered body.
#[derive(Debug, Parser)]
#[command(name = "comet-impact", version)]
struct Cli {
    /// JSON file overriding the default model constants
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Show frames in the terminal instead of saving a GIF
    #[arg(long, conflicts_with = "output")]
    live: bool,

    /// Where to save the animation
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of frames to render
    #[arg(short, long)]
    frames: Option<usize>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn effective_config(cli: &Cli) -> Result<SimConfig> {
    let mut config = match &cli.config {
        Some(path) => SimConfig::from_json_file(path)?,
        None => SimConfig::default(),
    };
    if let Some(frames) = cli.frames {
        config.time.frames = frames;
    }
    if cli.live {
        config.output = OutputStrategy::Live;
    } else if let Some(path) = &cli.output {
        config.output = OutputStrategy::Save { path: path.clone() };
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = effective_config(&cli)?;
    if cli.print_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    let driver = config.build_driver()?;
    let summary = driver.run_with_strategy(&config.output, config.render.fps)?;
    info!(
        frames = summary.frames,
        width = summary.width,
        height = summary.height,
        t_first = summary.first_time,
        t_last = summary.last_time,
        "done"
    );
    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
