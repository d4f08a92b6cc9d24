use clap::{Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use firebreak::cli::commands;
use firebreak::config::generation::GenerationParams;
use firebreak::config::simulation::SimulationConfig;

const DEFAULT_CONFIG: &str = "config.toml";

#[derive(Parser)]
#[command(name = "firebreak")]
#[command(about = "Swap tiles to keep a spreading fire away from the villages")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one valid grid and print it
    Generate {
        /// Seed for the generator (random if omitted)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Generation parameters file overriding the [generation] table
        #[arg(short, long)]
        worldgen: Option<String>,

        /// Print the grid as JSON
        #[arg(long)]
        json: bool,
    },

    /// Play in the terminal
    Play {
        /// Seed for the session (random if omitted)
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Run the game headless without player input
    Simulate {
        /// Seed for the session (random if omitted)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Stop after this many completed waves (0 = until game over)
        #[arg(short, long)]
        max_waves: Option<u32>,
    },
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: &str) -> SimulationConfig {
    // Only the default path may be missing.
    let result = if path == DEFAULT_CONFIG {
        SimulationConfig::from_file_or_default(Path::new(path))
    } else {
        SimulationConfig::from_file(Path::new(path))
    };
    match result {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let mut config = load_config(&cli.config);
    init_logging(&config.log_level, cli.log_json);

    let result = match cli.command {
        Commands::Generate {
            seed,
            worldgen,
            json,
        } => {
            if let Some(path) = worldgen {
                config.generation = match GenerationParams::from_file(Path::new(&path)) {
                    Ok(p) => p,
                    Err(e) => {
                        eprintln!("Error loading generation config: {}", e);
                        std::process::exit(1);
                    }
                };
            }
            commands::generate(&config, commands::resolve_seed(seed), json)
        }
        Commands::Play { seed } => commands::play(&config, commands::resolve_seed(seed)).await,
        Commands::Simulate { seed, max_waves } => commands::simulate(
            &config,
            commands::resolve_seed(seed),
            max_waves.unwrap_or(config.max_waves),
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
