//! Error types for deployment resolution and execution

use thiserror::Error;

use crate::domain::crn::CrnError;
use crate::domain::invariants::ConfigurationErrors;
use crate::domain::resource::ResourceAddress;
use crate::graph::GraphError;
use crate::service::activation::ActivationError;

/// Failure reported by an external collaborator (provisioning backend, key
/// service, secret store or settling strategy) for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("provisioning `{address}` failed: {message}")]
pub struct ProvisioningError {
    /// Address of the step that failed
    pub address: ResourceAddress,
    /// Backend-supplied reason
    pub message: String,
}

impl ProvisioningError {
    pub fn new(address: ResourceAddress, message: impl Into<String>) -> Self {
        Self {
            address,
            message: message.into(),
        }
    }
}

/// Outcome of a graph step that did not complete
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepFailure {
    /// The backend rejected the step
    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),

    /// A declared dependency failed, so the step was never attempted
    #[error("`{address}` not attempted: dependency `{dependency}` did not complete")]
    DependencyAborted {
        address: ResourceAddress,
        dependency: ResourceAddress,
    },
}

impl StepFailure {
    /// Address of the step this failure belongs to
    pub fn address(&self) -> &ResourceAddress {
        match self {
            StepFailure::Provisioning(err) => &err.address,
            StepFailure::DependencyAborted { address, .. } => address,
        }
    }
}

/// Errors that can occur while resolving or applying a deployment
#[derive(Debug, Error)]
pub enum DeploymentError {
    /// Input rejected by the validation gate; nothing was declared
    #[error("configuration rejected:\n{0}")]
    Configuration(#[from] ConfigurationErrors),

    /// An identifier could not be parsed
    #[error("malformed identifier: {0}")]
    MalformedIdentifier(#[from] CrnError),

    /// A collaborator failed outside of graph execution (key provisioning)
    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),

    /// One or more graph steps failed or were aborted
    #[error("{} step(s) did not complete: {}", failures.len(), summarize(failures))]
    Execution { failures: Vec<StepFailure> },

    /// The composed graph violated its ordering invariant
    #[error("invalid deployment graph: {0}")]
    InvalidGraph(#[from] GraphError),

    /// The model activation step failed
    #[error("model activation failed: {0}")]
    Activation(#[from] ActivationError),

    /// Resolved attributes did not have the expected shape
    #[error("unexpected attributes from `{address}`: {message}")]
    UnexpectedAttributes {
        address: ResourceAddress,
        message: String,
    },
}

/// Result type for deployment operations
pub type DeploymentResult<T> = Result<T, DeploymentError>;

fn summarize(failures: &[StepFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
