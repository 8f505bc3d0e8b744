// Copyright (c) 2025 - Cowboy AI, Inc.
//! Graph Executor
//!
//! Interprets a [`DeploymentGraph`] against the external collaborators.
//! The graph is pure data; this is the only place its steps turn into I/O.
//!
//! # Semantics
//!
//! Steps run in list order, which is a topological order by construction.
//! Before a step runs, its attribute bindings are filled from the resolved
//! attributes of earlier steps. A step whose dependency failed or was
//! aborted is never attempted and is recorded as
//! [`StepFailure::DependencyAborted`]; steps on independent branches still
//! run. Nothing is retried here.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

use super::{DeploymentGraph, PlanStep, ResourceDeclaration, SecretGroupDeclaration, StepAction};
use crate::backend::{ProvisioningBackend, ResolvedSecretGroup, SecretHandle, SecretStore};
use crate::domain::resource::{ResolvedAttributes, ResourceAddress, ResourceKind};
use crate::errors::{DeploymentError, DeploymentResult, ProvisioningError, StepFailure};
use crate::service::settle::SettleStrategy;

/// A declared resource and what the backend returned for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedResource {
    pub address: ResourceAddress,
    pub kind: ResourceKind,
    pub attributes: ResolvedAttributes,
}

/// Outcome of one graph execution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionReport {
    /// Declared resources in completion order
    pub resolved: Vec<ResolvedResource>,
    /// Settle steps that elapsed
    pub settled: Vec<ResourceAddress>,
    pub secret_handles: Vec<SecretHandle>,
    pub failures: Vec<StepFailure>,
}

impl ExecutionReport {
    pub fn get(&self, address: &ResourceAddress) -> Option<&ResolvedAttributes> {
        self.resolved
            .iter()
            .find(|resource| &resource.address == address)
            .map(|resource| &resource.attributes)
    }

    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &ResolvedResource> {
        self.resolved.iter().filter(move |resource| resource.kind == kind)
    }

    /// Step completed, either resolved or settled
    pub fn completed(&self, address: &ResourceAddress) -> bool {
        self.get(address).is_some() || self.settled.contains(address)
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fail with every recorded step failure
    pub fn into_result(self) -> DeploymentResult<Self> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(DeploymentError::Execution {
                failures: self.failures,
            })
        }
    }
}

/// Walks a graph and dispatches each step to its collaborator
pub struct GraphExecutor<'a> {
    backend: &'a dyn ProvisioningBackend,
    settler: &'a dyn SettleStrategy,
    secrets: &'a dyn SecretStore,
}

impl<'a> GraphExecutor<'a> {
    pub fn new(
        backend: &'a dyn ProvisioningBackend,
        settler: &'a dyn SettleStrategy,
        secrets: &'a dyn SecretStore,
    ) -> Self {
        Self {
            backend,
            settler,
            secrets,
        }
    }

    pub async fn execute(&self, graph: &DeploymentGraph) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        let mut incomplete: HashSet<ResourceAddress> = HashSet::new();

        info!(backend = self.backend.name(), steps = graph.len(), "Executing deployment graph");

        for step in graph.steps() {
            if let Some(dependency) = requirements(step).find(|dep| incomplete.contains(*dep)) {
                warn!(
                    address = %step.address,
                    dependency = %dependency,
                    "Dependency did not complete, step not attempted"
                );
                report.failures.push(StepFailure::DependencyAborted {
                    address: step.address.clone(),
                    dependency: dependency.clone(),
                });
                incomplete.insert(step.address.clone());
                continue;
            }

            if let Err(err) = self.run_step(step, &mut report).await {
                error!(address = %step.address, error = %err, "Step failed");
                report.failures.push(err.into());
                incomplete.insert(step.address.clone());
            }
        }

        info!(
            resolved = report.resolved.len(),
            failed = report.failures.len(),
            "Deployment graph executed"
        );
        report
    }

    async fn run_step(
        &self,
        step: &PlanStep,
        report: &mut ExecutionReport,
    ) -> Result<(), ProvisioningError> {
        match &step.action {
            StepAction::Declare(declaration) => {
                let desired = bind_attributes(&step.address, declaration, report)?;
                debug!(address = %step.address, kind = %declaration.kind, "Declaring resource");

                let attributes = self
                    .backend
                    .declare(&step.address, declaration.kind, &desired)
                    .await?;

                info!(address = %step.address, "Resource declared");
                report.resolved.push(ResolvedResource {
                    address: step.address.clone(),
                    kind: declaration.kind,
                    attributes,
                });
            }
            StepAction::Settle(settle) => {
                self.settler.settle(settle).await?;
                report.settled.push(step.address.clone());
            }
            StepAction::MirrorSecrets(group) => {
                let resolved = resolve_secret_group(&step.address, group, report)?;
                let handles = self.secrets.mirror_group(&resolved).await?;

                info!(
                    address = %step.address,
                    group = %group.group_name,
                    secrets = handles.len(),
                    "Secret group mirrored"
                );
                report.secret_handles.extend(handles);
            }
        }
        Ok(())
    }
}

/// Every address a step needs to have completed
fn requirements(step: &PlanStep) -> impl Iterator<Item = &ResourceAddress> {
    let implied: Vec<&ResourceAddress> = match &step.action {
        StepAction::Declare(declaration) => declaration.binding_sources().collect(),
        StepAction::Settle(settle) => vec![&settle.policy],
        StepAction::MirrorSecrets(group) => vec![&group.source_instance],
    };
    step.depends_on.iter().chain(implied)
}

fn bind_attributes(
    address: &ResourceAddress,
    declaration: &ResourceDeclaration,
    report: &ExecutionReport,
) -> Result<Map<String, Value>, ProvisioningError> {
    let mut desired = declaration.attributes.clone();

    for binding in &declaration.bindings {
        let value = report
            .get(&binding.source)
            .and_then(|attributes| attributes.get(&binding.attribute))
            .ok_or_else(|| {
                ProvisioningError::new(
                    address.clone(),
                    format!(
                        "binding `{}` needs `{}.{}`, which did not resolve",
                        binding.target_field, binding.source, binding.attribute
                    ),
                )
            })?;
        desired.insert(binding.target_field.clone(), value.clone());
    }

    Ok(desired)
}

fn resolve_secret_group(
    address: &ResourceAddress,
    group: &SecretGroupDeclaration,
    report: &ExecutionReport,
) -> Result<ResolvedSecretGroup, ProvisioningError> {
    let source_instance_crn = report
        .get(&group.source_instance)
        .and_then(|attributes| attributes.get_str("crn"))
        .ok_or_else(|| {
            ProvisioningError::new(
                address.clone(),
                format!("`{}` resolved without a crn", group.source_instance),
            )
        })?;

    Ok(ResolvedSecretGroup {
        address: address.clone(),
        declaration: group.clone(),
        source_instance_crn: source_instance_crn.to_string(),
    })
}
