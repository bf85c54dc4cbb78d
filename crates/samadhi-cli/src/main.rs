//! SAMADhi CLI - Main entry point

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use samadhi_cli::{Cli, CliError, Commands, Config};
use samadhi_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use samadhi_common::Categorized;
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // Honour a local .env before clap reads SAMADHI_CREDENTIALS
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Search output goes to stdout, so logs stay on stderr
    let log_config = LogConfig::builder()
        .level(if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        })
        .output(LogOutput::Console)
        .log_file_prefix("samadhi")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // The CLI works without logging
    let _guard = init_logging(&log_config).ok();

    if let Err(e) = execute_command(&cli).await {
        if let CliError::Usage(message) = &e {
            // Same presentation and exit status as argument-parsing errors
            Cli::command().error(ErrorKind::ArgumentConflict, message).exit();
        }
        error!(error = %e, category = %e.category(), "Command failed");
        eprintln!("Error: {e}");
        process::exit(e.category().exit_code());
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> samadhi_cli::Result<()> {
    let mut config = Config::from_env()?;
    if let Some(path) = &cli.credentials {
        config.set_credentials_path(path.clone());
    }

    match &cli.command {
        Commands::Search(args) => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            samadhi_cli::commands::search::run(args, &config, &mut out).await
        }
    }
}
