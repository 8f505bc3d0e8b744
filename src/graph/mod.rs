// Copyright (c) 2025 - Cowboy AI, Inc.
//! Desired-State Graph
//!
//! The composer turns a validated configuration into a [`DeploymentGraph`]:
//! an ordered list of steps with explicit dependencies. Steps are data; the
//! [`executor`] interprets them against the external collaborators.
//!
//! # Architecture
//!
//! ```text
//! DeploymentConfig ──compose()──> DeploymentGraph ──execute()──> ExecutionReport
//!    (pure input)                  (pure data)                  (backend I/O)
//! ```
//!
//! # Step Actions
//!
//! - [`StepAction::Declare`] - one resource for the provisioning backend
//! - [`StepAction::Settle`] - named wait after an authorization policy
//! - [`StepAction::MirrorSecrets`] - one secret group for the secret store
//!
//! # Ordering Invariant
//!
//! Every dependency names an EARLIER step, so list order is a valid
//! topological order. [`DeploymentGraph::push`] enforces this.

pub mod compose;
pub mod executor;
pub mod policy;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

use crate::config::SecretSpec;
use crate::domain::resource::{ResourceAddress, ResourceKind};

pub use compose::{compose_graph, CompositionInputs, ResourceGroupRef};
pub use executor::{ExecutionReport, GraphExecutor, ResolvedResource};
pub use policy::{gate_policy, AuthorizationPolicy, PolicyGate};

/// Graph construction error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("address `{0}` declared twice")]
    DuplicateAddress(ResourceAddress),

    #[error("`{step}` depends on `{dependency}`, which is not declared before it")]
    UnknownDependency {
        step: ResourceAddress,
        dependency: ResourceAddress,
    },
}

/// Copy a resolved attribute of an earlier step into this step's attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeBinding {
    pub target_field: String,
    pub source: ResourceAddress,
    pub attribute: String,
}

/// One resource for the provisioning backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDeclaration {
    pub kind: ResourceKind,
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<AttributeBinding>,
}

impl ResourceDeclaration {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            attributes: Map::new(),
            bindings: Vec::new(),
        }
    }

    /// Set a static attribute
    pub fn attr(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    /// Set a static attribute only when present
    pub fn attr_opt(self, name: &str, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(value) => self.attr(name, value),
            None => self,
        }
    }

    /// Fill `target_field` from `source.attribute` at execution time
    pub fn bind(mut self, target_field: &str, source: &ResourceAddress, attribute: &str) -> Self {
        self.bindings.push(AttributeBinding {
            target_field: target_field.to_string(),
            source: source.clone(),
            attribute: attribute.to_string(),
        });
        self
    }

    /// Addresses this declaration reads attributes from
    pub fn binding_sources(&self) -> impl Iterator<Item = &ResourceAddress> {
        self.bindings.iter().map(|binding| &binding.source)
    }
}

/// Named settling wait following an authorization policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleStep {
    pub policy: ResourceAddress,
    #[serde(with = "duration_secs")]
    pub duration: Duration,
}

/// One secret group mirrored into the secret store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretGroupDeclaration {
    pub group_name: String,
    pub description: Option<String>,
    pub existing_group: bool,
    pub secrets_manager_crn: String,
    /// Cluster whose credentials are mirrored; its `crn` is read at execution
    pub source_instance: ResourceAddress,
    pub secrets: Vec<SecretSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepAction {
    Declare(ResourceDeclaration),
    Settle(SettleStep),
    MirrorSecrets(SecretGroupDeclaration),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub address: ResourceAddress,
    #[serde(flatten)]
    pub action: StepAction,
    pub depends_on: Vec<ResourceAddress>,
}

impl PlanStep {
    pub fn kind(&self) -> Option<ResourceKind> {
        match &self.action {
            StepAction::Declare(declaration) => Some(declaration.kind),
            StepAction::Settle(_) | StepAction::MirrorSecrets(_) => None,
        }
    }
}

/// Ordered desired-state graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentGraph {
    steps: Vec<PlanStep>,
}

impl DeploymentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step; all dependencies and binding sources must already exist
    pub fn push(
        &mut self,
        address: ResourceAddress,
        action: StepAction,
        depends_on: Vec<ResourceAddress>,
    ) -> Result<ResourceAddress, GraphError> {
        if self.contains(&address) {
            return Err(GraphError::DuplicateAddress(address));
        }

        let mut required: Vec<&ResourceAddress> = depends_on.iter().collect();
        match &action {
            StepAction::Declare(declaration) => required.extend(declaration.binding_sources()),
            StepAction::Settle(settle) => required.push(&settle.policy),
            StepAction::MirrorSecrets(group) => required.push(&group.source_instance),
        }

        if let Some(missing) = required.into_iter().find(|dep| !self.contains(dep)) {
            return Err(GraphError::UnknownDependency {
                step: address,
                dependency: missing.clone(),
            });
        }

        self.steps.push(PlanStep {
            address: address.clone(),
            action,
            depends_on,
        });
        Ok(address)
    }

    pub fn contains(&self, address: &ResourceAddress) -> bool {
        self.steps.iter().any(|step| &step.address == address)
    }

    pub fn get(&self, address: &ResourceAddress) -> Option<&PlanStep> {
        self.steps.iter().find(|step| &step.address == address)
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    /// Steps declaring resources of `kind`, in graph order
    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &PlanStep> {
        self.steps.iter().filter(move |step| step.kind() == Some(kind))
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
