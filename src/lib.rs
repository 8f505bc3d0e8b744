//! Deployment resolution for managed search clusters
//!
//! This crate decides, from one immutable configuration record, which
//! resources a search cluster deployment needs, in what order, and with what
//! derived values (encryption keys, member group shape, credentials). The
//! cloud itself is reached only through the collaborator traits in
//! [`backend`], [`service::settle`] and [`service::activation`].

pub mod backend;
pub mod config;
pub mod domain;
pub mod errors;
pub mod graph;
pub mod service;

// Re-export commonly used types
pub use backend::{InMemoryBackend, KeyProvisioner, ProvisioningBackend, ScriptActivator, SecretStore};
pub use config::DeploymentConfig;
pub use errors::{DeploymentError, DeploymentResult, ProvisioningError, StepFailure};
pub use graph::{DeploymentGraph, ExecutionReport};
pub use service::{Deployer, DeploymentOutputs, DeploymentPlan};
