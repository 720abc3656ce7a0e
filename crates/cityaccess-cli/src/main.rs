use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::simulate::{Outcome, SimulateArgs};

#[derive(Parser)]
#[command(name = "cityaccess")]
#[command(about = "City-level taxi dispatch provider tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> city -> overrides...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Validate config and list providers with their capabilities
    Providers {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Fail on config keys no provider field reads
        #[arg(long, default_value_t = false)]
        strict: bool,
    },

    /// Drive one order through a reference provider built from config and
    /// print every step as JSON
    Simulate {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Provider name from the config
        #[arg(long)]
        provider: String,

        /// How the confirmed trip ends
        #[arg(long, value_enum, default_value_t = Outcome::NoShow)]
        outcome: Outcome,

        /// Pickup latitude
        #[arg(long, default_value_t = 32.0415, allow_negative_numbers = true)]
        lat: f64,

        /// Pickup longitude
        #[arg(long, default_value_t = 118.7781, allow_negative_numbers = true)]
        lng: f64,

        /// Offered surcharge in yuan
        #[arg(long)]
        price_increase: Option<f64>,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = cityaccess_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Providers {
            config_paths,
            strict,
        } => {
            commands::providers::run(&config_paths, strict)?;
        }

        Commands::Simulate {
            config_paths,
            provider,
            outcome,
            lat,
            lng,
            price_increase,
        } => {
            let report = commands::simulate::run(SimulateArgs {
                config_paths: &config_paths,
                provider: &provider,
                outcome,
                lat,
                lng,
                price_increase,
            })?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
