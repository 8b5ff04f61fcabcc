mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use flow_utils::setup_logging;

#[derive(Parser)]
#[command(name = "flow", version = env!("APP_VERSION"))]
#[command(about = "Rolls new image versions out to manifest repositories")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "flow.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite manifests for a newly pushed image and open pull requests
    Process {
        /// Image repository, e.g. registry/app
        #[arg(long)]
        image: String,

        /// Image tag, e.g. v1.2.3
        #[arg(long)]
        version: String,
    },
    /// Validate the configuration and list the manifests it targets
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Process { image, version } => {
            commands::process::handle_process(&cli.config, &image, &version).await
        }
        Commands::Check => commands::check::handle_check(&cli.config),
    }
}
