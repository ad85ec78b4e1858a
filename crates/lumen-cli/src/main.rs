//! lumen - tone-curve grading and chaos sleep-audio CLI
//!
//! Grades PNG images with XMP curve presets and filter looks, inspects
//! and authors presets, and simulates, runs or renders chaos sessions.

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod image_io;

#[derive(Parser)]
#[command(name = "lumen")]
#[command(author, version, about = "Tone-curve grading and chaos sleep-audio tool")]
#[command(long_about = "
Grades images with tone curves and filter looks, and drives chaos
sleep-audio sessions.

Examples:
  lumen apply photo.png -o graded.png --preset film.xmp --filter warm
  lumen apply photo.png -o post.png --square --watermark wm.yaml
  lumen lut film.xmp --channel red
  lumen preset show film.xmp
  lumen preset new soft.xmp --name Soft --point rgb:0.25,0.3 --saturation -10
  lumen chaos simulate --config chaos.yaml --seed 7
  lumen chaos render --config chaos.yaml --source rain.wav -o night.wav
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade an image with a curve preset and filter
    #[command(visible_alias = "a")]
    Apply(ApplyArgs),

    /// Print the 256-entry LUT of a preset curve
    Lut(LutArgs),

    /// Inspect or create XMP curve presets
    Preset(PresetArgs),

    /// Chaos sleep-audio sessions
    Chaos(ChaosArgs),
}

/// Arguments for the `apply` command.
#[derive(Args)]
struct ApplyArgs {
    /// Input PNG
    input: PathBuf,

    /// Output PNG
    #[arg(short, long)]
    output: PathBuf,

    /// XMP curve preset
    #[arg(short, long)]
    preset: Option<PathBuf>,

    /// Filter look (none, bw, sepia, warm, cool, ...)
    #[arg(short, long, default_value = "none")]
    filter: String,

    /// Saturation -100..100 (overrides the preset)
    #[arg(short, long, allow_hyphen_values = true)]
    saturation: Option<i32>,

    /// Crop to a centered square first
    #[arg(long)]
    square: bool,

    /// Watermark settings (YAML)
    #[arg(short, long)]
    watermark: Option<PathBuf>,

    /// Grade on a single thread
    #[arg(long)]
    serial: bool,
}

/// Arguments for the `lut` command.
#[derive(Args)]
struct LutArgs {
    /// XMP curve preset
    preset: PathBuf,

    /// Curve channel: rgb, red, green, blue
    #[arg(short, long, default_value = "rgb")]
    channel: String,
}

/// Arguments for the `preset` command.
#[derive(Args)]
struct PresetArgs {
    #[command(subcommand)]
    action: PresetAction,
}

#[derive(Subcommand)]
enum PresetAction {
    /// Show name, saturation and control points
    Show {
        /// XMP curve preset
        file: PathBuf,
    },

    /// Write a new preset
    New {
        /// Output XMP file
        output: PathBuf,

        /// Preset name
        #[arg(short, long)]
        name: String,

        /// Saturation -100..100
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        saturation: i32,

        /// Extra control point as CHANNEL:X,Y (repeatable)
        #[arg(long = "point")]
        points: Vec<String>,
    },
}

/// Arguments for the `chaos` command.
#[derive(Args)]
struct ChaosArgs {
    #[command(subcommand)]
    action: ChaosAction,
}

#[derive(Subcommand)]
enum ChaosAction {
    /// Print the phase timeline of a session without waiting
    Simulate {
        /// Session settings (YAML); defaults when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// RNG seed for a reproducible timeline
        #[arg(long)]
        seed: Option<u64>,

        /// Cut-off for unbounded sessions, in minutes
        #[arg(long, default_value = "60")]
        horizon_mins: u64,
    },

    /// Run a session in real time, logging output changes
    Run {
        /// Session settings (YAML); defaults when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Render a session over a looping WAV source
    Render {
        /// Session settings (YAML); defaults when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// 16-bit PCM WAV to loop
        #[arg(long)]
        source: PathBuf,

        /// Output WAV
        #[arg(short, long)]
        output: PathBuf,

        /// RNG seed for a reproducible render
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Configure thread pool
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Apply(args) => commands::apply::run(args, cli.verbose),
        Commands::Lut(args) => commands::lut::run(args),
        Commands::Preset(args) => match args.action {
            PresetAction::Show { file } => commands::preset::show(&file),
            PresetAction::New {
                output,
                name,
                saturation,
                points,
            } => commands::preset::create(&output, name, saturation, &points),
        },
        Commands::Chaos(args) => match args.action {
            ChaosAction::Simulate {
                config,
                seed,
                horizon_mins,
            } => commands::chaos::simulate(config.as_deref(), seed, horizon_mins),
            ChaosAction::Run { config } => commands::chaos::run(config.as_deref()),
            ChaosAction::Render {
                config,
                source,
                output,
                seed,
            } => commands::chaos::render(config.as_deref(), &source, &output, seed),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn apply_flags() {
        let cli = Cli::try_parse_from([
            "lumen", "-v", "apply", "in.png", "-o", "out.png", "--filter", "warm", "--saturation", "-20",
            "--square",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        let Commands::Apply(args) = cli.command else {
            panic!("expected apply");
        };
        assert_eq!(args.filter, "warm");
        assert_eq!(args.saturation, Some(-20));
        assert!(args.square);
        assert!(!args.serial);
        assert!(args.preset.is_none());
    }

    #[test]
    fn chaos_subcommands() {
        let cli = Cli::try_parse_from(["lumen", "chaos", "simulate", "--seed", "3", "-j", "2"]).unwrap();
        assert_eq!(cli.threads, 2);
        match cli.command {
            Commands::Chaos(ChaosArgs {
                action: ChaosAction::Simulate { config, seed, horizon_mins },
            }) => {
                assert!(config.is_none());
                assert_eq!(seed, Some(3));
                assert_eq!(horizon_mins, 60);
            }
            _ => panic!("expected chaos simulate"),
        }
        assert!(Cli::try_parse_from(["lumen", "chaos", "render", "-o", "x.wav"]).is_err());
    }

    #[test]
    fn preset_points_repeat() {
        let cli = Cli::try_parse_from([
            "lumen", "preset", "new", "p.xmp", "--name", "Soft", "--point", "rgb:0.2,0.3", "--point", "red:0.5,0.6",
        ])
        .unwrap();
        match cli.command {
            Commands::Preset(PresetArgs {
                action: PresetAction::New { points, saturation, .. },
            }) => {
                assert_eq!(points.len(), 2);
                assert_eq!(saturation, 0);
            }
            _ => panic!("expected preset new"),
        }
    }
}
