use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod config;
mod extract;
mod util;

use crate::config::{CorrelationStrategy, Variant};

#[derive(Parser)]
#[command(name = "signal-pages", version, about)]
struct Args {
    /// The command to execute
    #[command(subcommand)]
    command: SignalsCommand,
}

#[derive(Parser)]
struct InitArgs {
    /// The path to initialize the project in
    path: PathBuf,

    /// Whether to create the directory if it doesn't exist
    #[arg(short, long, default_value = "false")]
    create: bool,
}

#[derive(Parser)]
struct BuildArgs {
    /// The path to the configuration file (default: signals.yaml, if present)
    #[arg(short, long)]
    config_file: Option<PathBuf>,

    /// The HTML page containing the signal cards
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// The directory to write pages to
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Which pages to render
    #[arg(long, value_enum)]
    variant: Option<Variant>,

    /// The page template (template variant)
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// How chart data is matched to cards (chart variant)
    #[arg(long, value_enum)]
    strategy: Option<CorrelationStrategy>,

    /// Keep processing the remaining cards after one fails
    #[arg(long)]
    keep_going: bool,

    /// Also write a signals.json manifest of the extracted records
    #[arg(long)]
    manifest: bool,
}

#[derive(Parser)]
struct CleanArgs {
    /// The path to the configuration file (default: signals.yaml, if present)
    #[arg(short, long)]
    config_file: Option<PathBuf>,

    /// Only print what would be deleted
    #[arg(short, long, default_value = "false")]
    dry_run: bool,
}

#[derive(Subcommand)]
enum SignalsCommand {
    /// Create a starter config and template
    Init(InitArgs),

    /// Extract signal cards and render one page per card
    Build(BuildArgs),

    /// Delete the generated output directory
    Clean(CleanArgs),
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        SignalsCommand::Init(args) => {
            commands::init::run(&args).await?;
        }
        SignalsCommand::Build(args) => {
            commands::build::run(&args).await?;
        }
        SignalsCommand::Clean(args) => {
            commands::clean::run(&args).await?;
        }
    }

    Ok(())
}
