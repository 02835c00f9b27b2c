//! mulberry - terminal front end for the synth core
//!
//! Run with: cargo run -- tui

mod audio;
mod render;
mod ui;

use std::{fs::File, path::PathBuf, sync::Mutex, thread, time::Duration};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use mulberry::{Controller, SynthConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mulberry")]
#[command(author, version, about = "Mulberry oscillator and envelope synth", long_about = None)]
struct Cli {
    /// TOML file with the default tone and scale settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one tone on the default output device
    Tone,

    /// Play the C major scale on the default output device
    Scale,

    /// Render a tone (or the scale) to a 32-bit float WAV file
    Render {
        #[arg(long)]
        out: PathBuf,

        /// Render the scale instead of a single tone
        #[arg(long)]
        scale: bool,

        /// Output sample rate in Hz
        #[arg(long, default_value_t = 48_000)]
        sample_rate: u32,
    },

    /// Interactive terminal UI
    Tui,
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    // The TUI owns the terminal, so it only logs when given a file
    let quiet = matches!(cli.command, Commands::Tui);
    init_logging(cli.log_file.as_ref(), quiet)?;

    let config = match &cli.config {
        Some(path) => SynthConfig::load(path)
            .wrap_err_with(|| format!("failed to load config {}", path.display()))?,
        None => SynthConfig::default(),
    };

    match cli.command {
        Commands::Tone => play(&config, |controller| {
            controller.play_tone()?;
            Ok(())
        }),
        Commands::Scale => play(&config, |controller| {
            controller.play_scale()?;
            Ok(())
        }),
        Commands::Render {
            out,
            scale,
            sample_rate,
        } => render::render_to_wav(&config, &out, sample_rate, scale),
        Commands::Tui => ui::run(&config),
    }
}

fn init_logging(log_file: Option<&PathBuf>, quiet: bool) -> EyreResult<()> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| "mulberry=info".into());

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None if quiet => {
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(std::io::sink)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

/// Open the default device, fire `trigger` and wait until every voice retires.
fn play(
    config: &SynthConfig,
    trigger: impl FnOnce(&mut Controller) -> mulberry::Result<()>,
) -> EyreResult<()> {
    let (mut controller, _stream) = audio::start(config, None)?;
    trigger(&mut controller)?;

    while controller.live_voices() > 0 {
        thread::sleep(Duration::from_millis(20));
    }
    // Let the device drain its last buffer
    thread::sleep(Duration::from_millis(100));
    tracing::info!("playback finished");
    Ok(())
}
