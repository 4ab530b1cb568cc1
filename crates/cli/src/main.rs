//! Blog App E2E CLI - Main Entry Point
//!
//! Runs the blog application scenarios against a live instance, lists them,
//! prints their generated Playwright scripts and probes app readiness.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

mod commands;
mod output;

use blogapp_e2e::SuiteConfig;
use commands::{check, init, run, scenarios};

/// Blog App E2E - browser scenarios for the blog application
#[derive(Parser)]
#[command(name = "blogapp-e2e")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Config file (missing file means defaults)
    #[arg(long, default_value = "blogapp-e2e.toml", env = "BLOGAPP_E2E_CONFIG", global = true)]
    config: PathBuf,

    /// Application root URL the browser opens
    #[arg(long, env = "BLOGAPP_FRONTEND_URL", global = true)]
    frontend_url: Option<String>,

    /// Backend URL used to seed accounts
    #[arg(long, env = "BLOGAPP_BACKEND_URL", global = true)]
    backend_url: Option<String>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scenarios against the live application
    Run(run::RunArgs),

    /// List available scenarios
    List,

    /// Print the Playwright script generated for a scenario
    Script {
        /// Scenario name
        name: String,
    },

    /// Check that the application and Playwright are reachable
    Check,

    /// Write a default config file
    InitConfig {
        /// Destination path (defaults to --config)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::InitConfig { path, force } => {
            let path = path.unwrap_or(cli.config);
            init::execute(&path, force)?;
        }
        Commands::Run(args) => {
            let config = load_config(&cli.config, &cli.frontend_url, &cli.backend_url)?;
            let success = run::execute(args, config, cli.format).await?;
            if !success {
                std::process::exit(1);
            }
        }
        Commands::List => {
            let config = load_config(&cli.config, &cli.frontend_url, &cli.backend_url)?;
            scenarios::list(&config, cli.format)?;
        }
        Commands::Script { name } => {
            let config = load_config(&cli.config, &cli.frontend_url, &cli.backend_url)?;
            scenarios::script(&config, &name)?;
        }
        Commands::Check => {
            let config = load_config(&cli.config, &cli.frontend_url, &cli.backend_url)?;
            if !check::execute(&config).await {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Load the config file and apply URL overrides from flags or environment
fn load_config(
    path: &Path,
    frontend_url: &Option<String>,
    backend_url: &Option<String>,
) -> anyhow::Result<SuiteConfig> {
    let mut config = SuiteConfig::load(path)?;
    if let Some(url) = frontend_url {
        config.app.frontend_url = url.clone();
    }
    if let Some(url) = backend_url {
        config.app.backend_url = url.clone();
    }
    config.validate()?;
    Ok(config)
}
