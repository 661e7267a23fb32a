mod handlers;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use handlers::{handle_encode_hparams, handle_inspect};
use tracing_subscriber::EnvFilter;
use unity::ModelArch;

#[derive(Parser)]
#[command(name = "unity_cli")]
#[command(about = "Inspect and build UnitY checkpoints", long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a checkpoint and print its hyperparameters and tensor layout
    Inspect {
        /// Path to the checkpoint
        checkpoint: PathBuf,
        /// Model architecture tag
        #[arg(long, default_value_t = ModelArch::UnitY)]
        arch: ModelArch,
        /// Only list tensors under this dotted prefix
        #[arg(long)]
        prefix: Option<String>,
        /// Print the report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write the binary hyperparameter header described by a JSON file
    EncodeHparams {
        /// JSON file with the hyperparameters
        json: PathBuf,
        /// Output file
        output: PathBuf,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Inspect {
            checkpoint,
            arch,
            prefix,
            json,
        } => handle_inspect(&checkpoint, arch, prefix.as_deref(), json),
        Commands::EncodeHparams {
            json,
            output,
        } => handle_encode_hparams(&json, &output),
    }
}
