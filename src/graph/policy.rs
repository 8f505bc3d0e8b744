// Copyright (c) 2025 - Cowboy AI, Inc.
//! Authorization Policy Orchestration
//!
//! Permission grants propagate asynchronously, so every policy declared in a
//! run is followed by its own named settle step, and resources needing the
//! permission depend on the SETTLE step rather than the policy itself:
//!
//! ```text
//! authorization_policy.kms ──> settle.kms_authorization ──> database.search
//! authorization_policy.secrets_manager ──> settle.secrets_manager_authorization ──> secret_group[..]
//! ```
//!
//! The wait itself is performed by a [`crate::service::settle::SettleStrategy`],
//! so a fixed delay can be swapped for polling without touching the graph.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{DeploymentGraph, GraphError, ResourceDeclaration, SettleStep, StepAction};
use crate::domain::resource::{ResourceAddress, ResourceKind};

/// IAM service name of the search cluster
pub const DATABASE_SERVICE_NAME: &str = "databases-for-elasticsearch";

/// IAM service name of the secret store
pub const SECRETS_MANAGER_SERVICE_NAME: &str = "secrets-manager";

/// Role granted on the key management instance
pub const KMS_READER_ROLE: &str = "Reader";

/// Role granted to the secret store on the cluster
pub const KEY_MANAGER_ROLE: &str = "Key Manager";

/// Directed permission edge `source service → target service instance`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationPolicy {
    pub source_service_name: String,
    pub source_resource_instance_id: Option<String>,
    pub target_service_name: String,
    /// Static target instance; `None` when bound from a declared resource
    pub target_resource_instance_id: Option<String>,
    pub roles: Vec<String>,
    pub description: String,
    /// Created with the credential of the account owning the target
    pub cross_account: bool,
}

impl AuthorizationPolicy {
    /// Cluster reads keys from the key management instance
    pub fn kms_read(kms_service_name: &str, kms_instance_guid: &str, cross_account: bool) -> Self {
        Self {
            source_service_name: DATABASE_SERVICE_NAME.to_string(),
            source_resource_instance_id: None,
            target_service_name: kms_service_name.to_string(),
            target_resource_instance_id: Some(kms_instance_guid.to_string()),
            roles: vec![KMS_READER_ROLE.to_string()],
            description: format!(
                "Allow all {} instances to read keys from {} instance {}",
                DATABASE_SERVICE_NAME, kms_service_name, kms_instance_guid
            ),
            cross_account,
        }
    }

    /// Secret store manages credentials of the cluster; target bound later
    pub fn secrets_manager_write(secrets_manager_guid: &str) -> Self {
        Self {
            source_service_name: SECRETS_MANAGER_SERVICE_NAME.to_string(),
            source_resource_instance_id: Some(secrets_manager_guid.to_string()),
            target_service_name: DATABASE_SERVICE_NAME.to_string(),
            target_resource_instance_id: None,
            roles: vec![KEY_MANAGER_ROLE.to_string()],
            description: format!(
                "Allow {} instance {} to manage credentials of the {} instance",
                SECRETS_MANAGER_SERVICE_NAME, secrets_manager_guid, DATABASE_SERVICE_NAME
            ),
            cross_account: false,
        }
    }

    pub fn into_declaration(self) -> ResourceDeclaration {
        ResourceDeclaration::new(ResourceKind::AuthorizationPolicy)
            .attr("source_service_name", self.source_service_name)
            .attr_opt("source_resource_instance_id", self.source_resource_instance_id)
            .attr("target_service_name", self.target_service_name)
            .attr_opt("target_resource_instance_id", self.target_resource_instance_id)
            .attr("roles", self.roles)
            .attr("description", self.description)
            .attr("cross_account", self.cross_account)
    }
}

/// Addresses of a declared policy and its settle step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyGate {
    pub policy: ResourceAddress,
    /// Dependents list this address, never the policy directly
    pub settled: ResourceAddress,
}

/// Declare a policy followed by its settle step
pub fn gate_policy(
    graph: &mut DeploymentGraph,
    name: &str,
    declaration: ResourceDeclaration,
    depends_on: Vec<ResourceAddress>,
    delay: Duration,
) -> Result<PolicyGate, GraphError> {
    let policy = graph.push(
        ResourceAddress::single(ResourceKind::AuthorizationPolicy.as_str(), name),
        StepAction::Declare(declaration),
        depends_on,
    )?;

    let settled = graph.push(
        ResourceAddress::single("settle", &format!("{}_authorization", name)),
        StepAction::Settle(SettleStep {
            policy: policy.clone(),
            duration: delay,
        }),
        vec![policy.clone()],
    )?;

    Ok(PolicyGate { policy, settled })
}
