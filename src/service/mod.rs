// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Layer for Search Cluster Deployments
//!
//! Coordinates the pure domain rules with the external collaborators.
//!
//! # Architecture
//!
//! ```text
//! DeploymentConfig
//!     ↓
//! Validation Gate (domain::invariants)
//!     ↓
//! KMS Resolver (kms) ──> KeyProvisioner
//!     ↓
//! Topology Selector + Resource Composer (graph)
//!     ↓
//! GraphExecutor ──> ProvisioningBackend / SettleStrategy / SecretStore
//!     ↓
//! Credential Harvester (domain::credentials)
//!     ↓
//! Model activation (activation) ──> ModelActivator
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use search_cluster_infrastructure::backend::InMemoryBackend;
//! use search_cluster_infrastructure::config::DeploymentConfig;
//! use search_cluster_infrastructure::service::Deployer;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DeploymentConfig::from_file("deployment.json")?.apply_env_overrides();
//! let deployer = Deployer::in_memory(InMemoryBackend::new());
//! let outputs = deployer.deploy(&config).await?;
//! println!("{}", outputs.crn);
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod deployer;
pub mod kms;
pub mod settle;

pub use activation::{activate_model, ActivationEnv, ActivationError, ModelActivator};
pub use deployer::{Deployer, DeploymentOutputs, DeploymentPlan};
pub use kms::resolve_encryption;
pub use settle::{FixedDelay, SettleStrategy};
