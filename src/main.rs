//! Rendr - server-side rendering for React components
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use rendr::cli::{Cli, Commands};
use rendr::config::ConfigManager;
use rendr::error::{RendrError, RendrResult};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> RendrResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    // Find local config unless --no-local is set
    let local_config_path = if cli.no_local {
        None
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| RendrError::io("getting current directory", e))?;
        ConfigManager::find_local_config(&cwd)
    };

    let mut config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;
    if let Some(dir) = cli.frontend_dir {
        config.engine.frontend_dir = dir;
    }

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("rendr=warn"),
        1 => EnvFilter::new("rendr=info"),
        _ => EnvFilter::new("rendr=debug"),
    };
    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .init();
    }

    if let Some(ref path) = local_config_path {
        debug!("Merged local config: {}", path.display());
    }

    // Dispatch to command
    match cli.command {
        Commands::Render(args) => rendr::cli::commands::render(args, &config).await,
        Commands::Client(args) => rendr::cli::commands::client(args, &config).await,
        Commands::Dev(args) => rendr::cli::commands::dev(args, &config).await,
        Commands::Status => rendr::cli::commands::status(&config).await,
        Commands::Config(args) => {
            rendr::cli::commands::config(args, &config, &config_manager).await
        }
    }
}
