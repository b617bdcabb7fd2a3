mod db;
mod nearby;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::nearby::NearbyArgs;

#[derive(Debug, Parser)]
#[command(name = "medimatch-cli")]
#[command(about = "Hospital and doctor matching command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Upsert hospitals and doctors from a YAML seed file
    Seed {
        /// Path to the seed file
        #[arg(long, default_value = "./config/providers.yaml")]
        file: PathBuf,
    },
    /// Find providers near a location and print the JSON response
    Nearby(NearbyArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let log_level = std::env::var("MEDIMATCH_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    // Logs go to stderr so `nearby` output stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Migrate) => db::run_migrate().await?,
        Some(Commands::Seed { file }) => db::run_seed(&file).await?,
        Some(Commands::Nearby(args)) => nearby::run_nearby(&args).await?,
        None => println!("medimatch-cli: run with --help to list commands"),
    }

    Ok(())
}
