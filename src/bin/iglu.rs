//! Iglu CLI
//!
//! Resolves schemas and validates self-describing JSON from the command line.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use iglu_client::{ClientConfig, Resolver, SchemaKey};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "iglu")]
#[command(about = "Resolve Iglu schemas and validate self-describing JSON")]
struct Cli {
    /// Resolver configuration (self-describing JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Client settings file (TOML)
    #[arg(short, long)]
    settings: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the schema for an Iglu URI
    Lookup {
        /// e.g. iglu:com.acme/link_click/jsonschema/1-0-0
        uri: String,
    },

    /// Validate a self-describing JSON file
    Validate {
        file: PathBuf,
    },

    /// Show the order registries are visited in for an Iglu URI
    Order {
        uri: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = ClientConfig::load_from(cli.settings.as_deref())
        .context("loading client settings")?;

    let config_path = cli.config.or_else(|| settings.resolver.config_path.clone());
    let resolver = match config_path {
        Some(path) => Resolver::from_path(&path, &settings)
            .with_context(|| format!("loading resolver configuration {}", path.display()))?,
        None => Resolver::new(Vec::new(), None),
    };

    match cli.command {
        Commands::Lookup { uri } => {
            let schema = resolver.lookup_schema_uri(&uri)?;
            println!("{}", serde_json::to_string_pretty(&*schema)?);
        }

        Commands::Validate { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let instance: serde_json::Value = serde_json::from_str(&content)?;
            match resolver.validate(&instance) {
                Ok(()) => println!("✅ {} is valid", file.display()),
                Err(e) if e.is_validation() => {
                    println!("❌ {} is invalid", file.display());
                    println!("   {}", e);
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Order { uri } => {
            let key = SchemaKey::parse(&uri)?;
            for (position, registry) in resolver.prioritize(&key).into_iter().enumerate() {
                println!(
                    "{}. {} ({}, priority {}{})",
                    position + 1,
                    registry.name(),
                    registry.descriptor(),
                    registry.config().priority,
                    if registry.vendor_matched(&key) { ", vendor match" } else { "" }
                );
            }
        }
    }

    Ok(())
}
