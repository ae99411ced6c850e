use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nbody_galaxy::config::SimConfig;
use nbody_galaxy::{app, headless};

/// Default number of headless steps (about 16 simulated seconds)
const DEFAULT_STEPS: u64 = 1000;

/// A disk galaxy of point sprites orbiting a central attractor.
#[derive(Parser)]
#[command(name = "nbody-galaxy")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Number of particles (overrides the config file)
    #[arg(short = 'n', long, global = true)]
    particles: Option<usize>,

    /// RNG seed for a reproducible galaxy (overrides the config file)
    #[arg(short, long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the viewer window (default behavior)
    View,
    /// Run without a window and print a JSON summary
    Simulate {
        /// Number of fixed timesteps
        #[arg(long, default_value_t = DEFAULT_STEPS)]
        steps: u64,

        /// Timestep in seconds (clamped to the configured max_dt)
        #[arg(long, default_value_t = 0.016)]
        dt: f32,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries the JSON summary
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(
    path: Option<&Path>,
    particles: Option<usize>,
    seed: Option<u64>,
) -> anyhow::Result<SimConfig> {
    let mut config = match path {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    if let Some(particles) = particles {
        config.particles = particles;
    }
    if seed.is_some() {
        config.seed = seed;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = load_config(cli.config.as_deref(), cli.particles, cli.seed)?;

    match cli.command {
        Some(Commands::Simulate { steps, dt }) => {
            let summary = headless::simulate(&config, steps, dt)?;
            println!("{}", summary.to_json()?);
        }
        Some(Commands::View) | None => {
            tracing::info!(particles = config.particles, "starting viewer");
            app::run(config)?;
        }
    }

    Ok(())
}
