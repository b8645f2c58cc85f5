//! ptm - Proxmox template maker
//!
//! Creates virtual machine templates on a Proxmox VE host and customizes the
//! cloud images they are built from.

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ptm_rs::config::{loader, ConfigLoader, Configuration};
use ptm_rs::pipeline::ProcessRunner;
use ptm_rs::prompt::TerminalPrompter;
use ptm_rs::resolver::MakeFlags;
use ptm_rs::tasks::{self, LIBGUESTFS_PACKAGE, PROXMOX_PACKAGE};

#[derive(Parser)]
#[command(name = "ptm")]
#[command(author, version, about = "Proxmox template maker", long_about = None)]
struct Cli {
    /// Enable verbose output (overrides the configured log level)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory of the configuration file
    #[arg(long, global = true, default_value = loader::CONFIG_PATH)]
    configuration_path: String,

    /// Name of the configuration file, without extension
    #[arg(long, global = true, default_value = loader::CONFIG_NAME)]
    configuration_name: String,

    /// Extension of the configuration file (yaml / yml / json)
    #[arg(long, global = true, default_value = loader::CONFIG_EXTENSION)]
    configuration_extension: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a template, asking for anything flags and configuration leave open
    Make(MakeFlags),
    /// Download the configured base image and install packages into an image
    Customize,
}

/// Map `-v` occurrences, or the configured `log_level` without any
fn log_level(verbosity: u8, configured: &str) -> Level {
    match verbosity {
        0 => match configured.to_ascii_lowercase().as_str() {
            "t" | "trace" => Level::TRACE,
            "d" | "debug" => Level::DEBUG,
            "w" | "warn" | "warning" => Level::WARN,
            "e" | "error" => Level::ERROR,
            _ => Level::INFO,
        },
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn init_logging(level: Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

async fn load_configuration(cli: &Cli) -> anyhow::Result<Configuration> {
    let loader = ConfigLoader::new()
        .with_path(&cli.configuration_path)
        .with_name(&cli.configuration_name)
        .with_extension(&cli.configuration_extension);

    Ok(loader.load().await?)
}

async fn run(cli: Cli, configuration: Configuration) -> anyhow::Result<()> {
    let mut prompter = TerminalPrompter::stdio();

    match &cli.command {
        Commands::Make(flags) => {
            tasks::preflight(PROXMOX_PACKAGE).await?;
            let spec = tasks::make(&configuration, flags, &mut prompter, &ProcessRunner).await?;
            info!("Template {} is ready", spec.identifier);
        }
        Commands::Customize => {
            tasks::preflight(LIBGUESTFS_PACKAGE).await?;
            let image = tasks::customize(&configuration, &mut prompter, &ProcessRunner).await?;
            info!("Customized image available at {}", image);
        }
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // logging starts once the configured level is known
    let configuration = load_configuration(&cli).await;
    let configured_level = configuration
        .as_ref()
        .map(|c| c.log_level.as_str())
        .unwrap_or("i");
    init_logging(log_level(cli.verbose, configured_level));

    let result = match configuration {
        Ok(configuration) => run(cli, configuration).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
