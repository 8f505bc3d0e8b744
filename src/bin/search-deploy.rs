// Copyright (c) 2025 - Cowboy AI, Inc.
//! Search Cluster Deployment CLI
//!
//! ```bash
//! # Run the validation gate and print every failed rule
//! search-deploy validate deployment.json
//!
//! # Print the resolved desired-state graph as JSON
//! search-deploy plan deployment.json
//!
//! # Run the whole deployment against the in-memory backend
//! search-deploy simulate deployment.json --activation-scripts ./scripts
//! ```
//!
//! `SEARCH_DEPLOY_REGION`, `SEARCH_DEPLOY_PREFIX` and
//! `SEARCH_DEPLOY_KMS_API_KEY` override the file. Log verbosity follows
//! `RUST_LOG` (default `info`).

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use search_cluster_infrastructure::domain::invariants::validate_configuration;
use search_cluster_infrastructure::backend::DeferredKeyProvisioner;
use search_cluster_infrastructure::{Deployer, DeploymentConfig, InMemoryBackend, ScriptActivator};

#[derive(Parser)]
#[command(name = "search-deploy")]
#[command(about = "Resolve and simulate managed search cluster deployments", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a configuration against every validation rule
    Validate {
        /// Deployment configuration (JSON)
        config: PathBuf,
    },

    /// Resolve encryption and topology and print the deployment graph
    ///
    /// No key service is contacted: a key that would be provisioned appears
    /// as `<provisioned:{service}:{ring}/{key}>`.
    Plan {
        config: PathBuf,
    },

    /// Deploy against the in-memory backend and print the outputs
    Simulate {
        config: PathBuf,

        /// Directory holding install_model.sh and start_model.sh
        #[arg(long)]
        activation_scripts: Option<PathBuf>,
    },
}

fn load(path: &Path) -> Result<DeploymentConfig> {
    let config = DeploymentConfig::from_file(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    Ok(config.apply_env_overrides())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config } => {
            let config = load(&config)?;
            if let Err(errors) = validate_configuration(&config) {
                eprintln!("{}", errors);
                bail!("{} validation rule(s) failed", errors.errors().len());
            }
            println!("configuration is valid");
        }
        Commands::Plan { config } => {
            let config = load(&config)?;
            let plan = Deployer::in_memory(InMemoryBackend::new())
                .with_key_provisioner(Arc::new(DeferredKeyProvisioner))
                .plan(&config)
                .await
                .context("failed to resolve deployment plan")?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Commands::Simulate {
            config,
            activation_scripts,
        } => {
            let config = load(&config)?;
            let mut deployer = Deployer::in_memory(InMemoryBackend::new());
            if let Some(directory) = activation_scripts {
                info!(directory = %directory.display(), "Using activation scripts");
                deployer = deployer.with_activator(Arc::new(ScriptActivator::from_directory(directory)));
            }

            let outputs = deployer
                .deploy(&config)
                .await
                .context("simulated deployment failed")?;
            println!("{}", serde_json::to_string_pretty(&outputs)?);
        }
    }

    Ok(())
}
