// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Composer
//!
//! Assembles the desired-state graph from the validated configuration and
//! the already resolved encryption plan and topology. Composition is pure:
//! it reads its inputs and returns data.
//!
//! # Order
//!
//! ```text
//! resource_group ─┐
//! kms policy ─> settle ─┤
//!                       └─> database ─┬─> access_tag
//!                                     ├─> context_rule[0..n]
//!                                     ├─> service_credential["name"]..
//!                                     └─> secrets manager policy ─> settle ─> secret_group["name"]..
//! ```

use serde_json::{json, Map, Value};

use super::policy::{gate_policy, AuthorizationPolicy, DATABASE_SERVICE_NAME};
use super::{DeploymentGraph, GraphError, ResourceDeclaration, SecretGroupDeclaration, StepAction};
use crate::config::{ContextRuleSpec, DeploymentConfig, EnforcementMode};
use crate::domain::crn::Crn;
use crate::domain::encryption::EncryptionPlan;
use crate::domain::resource::{ResourceAddress, ResourceKind};
use crate::domain::topology::{AutoScalingPolicy, ClusterTopology};

/// Label shared by every address the composer emits
pub const INSTANCE_LABEL: &str = "search";

/// Where the cluster's resource group comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceGroupRef {
    /// Caller supplied the id of an existing group
    Existing(String),
    /// Group declared by this run; its `id` is bound into the cluster
    Declared(ResourceAddress),
}

/// Everything the composer reads
#[derive(Debug, Clone, Copy)]
pub struct CompositionInputs<'a> {
    pub config: &'a DeploymentConfig,
    pub encryption: &'a EncryptionPlan,
    pub topology: &'a ClusterTopology,
    /// Parsed secret store instance; required when secret groups are configured
    pub secrets_manager: Option<&'a Crn>,
}

/// Build the desired-state graph
pub fn compose_graph(inputs: &CompositionInputs<'_>) -> Result<DeploymentGraph, GraphError> {
    let config = inputs.config;
    let mut graph = DeploymentGraph::new();

    let resource_group = declare_resource_group(&mut graph, config)?;

    let mut database_deps: Vec<ResourceAddress> = Vec::new();
    if let ResourceGroupRef::Declared(address) = &resource_group {
        database_deps.push(address.clone());
    }

    if let Some(policy) = kms_policy(config, inputs.encryption) {
        let gate = gate_policy(
            &mut graph,
            "kms",
            policy.into_declaration(),
            Vec::new(),
            config.settling_delay(),
        )?;
        database_deps.push(gate.settled);
    }

    let database = graph.push(
        ResourceAddress::single(ResourceKind::DatabaseInstance.as_str(), INSTANCE_LABEL),
        StepAction::Declare(database_declaration(inputs, &resource_group)),
        database_deps,
    )?;

    if !config.access_tags.is_empty() {
        graph.push(
            ResourceAddress::single(ResourceKind::AccessTag.as_str(), INSTANCE_LABEL),
            StepAction::Declare(
                ResourceDeclaration::new(ResourceKind::AccessTag)
                    .attr("tags", config.access_tags.clone())
                    .attr("tag_type", "access")
                    .bind("resource_id", &database, "crn"),
            ),
            vec![database.clone()],
        )?;
    }

    for (index, rule) in config.cbr_rules.iter().enumerate() {
        graph.push(
            ResourceAddress::indexed(ResourceKind::ContextRule.as_str(), INSTANCE_LABEL, index),
            StepAction::Declare(context_rule_declaration(rule, &database)),
            vec![database.clone()],
        )?;
    }

    let endpoint_type = config.service_endpoints.credential_endpoint_type();
    for request in config.service_credential_names.iter() {
        graph.push(
            ResourceAddress::keyed(
                ResourceKind::ServiceCredential.as_str(),
                INSTANCE_LABEL,
                &request.name,
            ),
            StepAction::Declare(
                ResourceDeclaration::new(ResourceKind::ServiceCredential)
                    .attr("name", request.name.as_str())
                    .attr("role", request.role.as_str())
                    .attr("endpoint_type", endpoint_type)
                    .bind("resource_instance_id", &database, "id"),
            ),
            vec![database.clone()],
        )?;
    }

    compose_secret_groups(&mut graph, inputs, &database)?;

    Ok(graph)
}

fn declare_resource_group(
    graph: &mut DeploymentGraph,
    config: &DeploymentConfig,
) -> Result<ResourceGroupRef, GraphError> {
    if let Some(id) = &config.resource_group_id {
        return Ok(ResourceGroupRef::Existing(id.clone()));
    }

    let name = config.resource_group_name.as_deref().unwrap_or("default");
    let address = graph.push(
        ResourceAddress::single(ResourceKind::ResourceGroup.as_str(), INSTANCE_LABEL),
        StepAction::Declare(
            ResourceDeclaration::new(ResourceKind::ResourceGroup).attr("name", config.prefixed(name)),
        ),
        Vec::new(),
    )?;
    Ok(ResourceGroupRef::Declared(address))
}

/// Key-read policy, needed when encryption is on and not skipped
fn kms_policy(config: &DeploymentConfig, encryption: &EncryptionPlan) -> Option<AuthorizationPolicy> {
    if !config.encryption.kms_encryption_enabled || config.encryption.skip_iam_authorization_policy {
        return None;
    }

    let instance = encryption.kms_instance.as_ref()?;
    Some(AuthorizationPolicy::kms_read(
        &instance.service_name(encryption.key_service_family),
        &instance.guid,
        encryption.requires_cross_account_policy,
    ))
}

fn database_declaration(
    inputs: &CompositionInputs<'_>,
    resource_group: &ResourceGroupRef,
) -> ResourceDeclaration {
    let config = inputs.config;

    let credential_names: Map<String, Value> = config
        .service_credential_names
        .iter()
        .map(|request| (request.name.clone(), Value::from(request.role.as_str())))
        .collect();

    let declaration = ResourceDeclaration::new(ResourceKind::DatabaseInstance)
        .attr("name", config.instance_name())
        .attr("service", DATABASE_SERVICE_NAME)
        .attr("plan", config.plan.as_str())
        .attr("location", config.region.as_str())
        .attr_opt("version", config.version.clone())
        .attr("service_endpoints", config.service_endpoints.as_str())
        .attr("tags", config.tags.clone())
        .attr_opt("key_protect_key", inputs.encryption.primary_key_crn.clone())
        .attr_opt(
            "backup_encryption_key_crn",
            inputs.encryption.backup_key_crn.clone(),
        )
        .attr_opt("backup_id", config.backup_crn.clone())
        .attr("group", topology_attributes(inputs.topology))
        .attr_opt(
            "auto_scaling",
            config.topology.auto_scaling.as_ref().map(auto_scaling_attributes),
        )
        .attr("service_credential_names", credential_names);

    match resource_group {
        ResourceGroupRef::Existing(id) => declaration.attr("resource_group_id", id.as_str()),
        ResourceGroupRef::Declared(address) => declaration.bind("resource_group_id", address, "id"),
    }
}

fn topology_attributes(topology: &ClusterTopology) -> Value {
    match topology {
        ClusterTopology::FixedFlavor {
            flavor_id,
            disk_mb,
            member_count,
        } => json!({
            "group_id": "member",
            "members": { "allocation_count": member_count },
            "disk": { "allocation_mb": disk_mb },
            "host_flavor": { "id": flavor_id },
        }),
        ClusterTopology::MultitenantFlavor {
            flavor_id,
            disk_mb,
            memory_mb,
            cpu_count,
            member_count,
        } => json!({
            "group_id": "member",
            "members": { "allocation_count": member_count },
            "memory": { "allocation_mb": memory_mb },
            "disk": { "allocation_mb": disk_mb },
            "cpu": { "allocation_count": cpu_count },
            "host_flavor": { "id": flavor_id },
        }),
        ClusterTopology::ClassicSized {
            memory_mb,
            disk_mb,
            cpu_count,
            member_count,
        } => json!({
            "group_id": "member",
            "members": { "allocation_count": member_count },
            "memory": { "allocation_mb": memory_mb },
            "disk": { "allocation_mb": disk_mb },
            "cpu": { "allocation_count": cpu_count },
        }),
    }
}

fn auto_scaling_attributes(policy: &AutoScalingPolicy) -> Value {
    let disk = &policy.disk;
    let memory = &policy.memory;
    json!({
        "disk": {
            "capacity_enabled": disk.capacity_enabled,
            "free_space_less_than_percent": disk.free_space_less_than_percent,
            "io_above_percent": disk.io_above_percent,
            "io_enabled": disk.io_enabled,
            "io_over_period": disk.io_over_period,
            "rate_increase_percent": disk.rate_increase_percent,
            "rate_limit_mb_per_member": disk.rate_limit_mb_per_member,
            "rate_period_seconds": disk.rate_period_seconds,
            "rate_units": disk.rate_units,
        },
        "memory": {
            "io_above_percent": memory.io_above_percent,
            "io_enabled": memory.io_enabled,
            "io_over_period": memory.io_over_period,
            "rate_increase_percent": memory.rate_increase_percent,
            "rate_limit_mb_per_member": memory.rate_limit_mb_per_member,
            "rate_period_seconds": memory.rate_period_seconds,
            "rate_units": memory.rate_units,
        },
    })
}

fn context_rule_declaration(rule: &ContextRuleSpec, database: &ResourceAddress) -> ResourceDeclaration {
    let contexts: Vec<Value> = rule
        .rule_contexts
        .iter()
        .map(|context| {
            let attributes: Vec<Value> = context
                .attributes
                .iter()
                .map(|attribute| json!({ "name": attribute.name, "value": attribute.value }))
                .collect();
            json!({ "attributes": attributes })
        })
        .collect();

    let enforcement_mode = match rule.enforcement_mode {
        EnforcementMode::Enabled => "enabled",
        EnforcementMode::Disabled => "disabled",
        EnforcementMode::Report => "report",
    };

    ResourceDeclaration::new(ResourceKind::ContextRule)
        .attr("description", rule.description.as_str())
        .attr("enforcement_mode", enforcement_mode)
        .attr("rule_contexts", contexts)
        .attr("account_id", rule.account_id.as_str())
        .attr("service_name", DATABASE_SERVICE_NAME)
        .bind("service_instance", database, "guid")
}

fn compose_secret_groups(
    graph: &mut DeploymentGraph,
    inputs: &CompositionInputs<'_>,
    database: &ResourceAddress,
) -> Result<(), GraphError> {
    let secrets = &inputs.config.secrets;
    let Some(secrets_manager) = inputs.secrets_manager else {
        return Ok(());
    };
    if secrets.service_credential_secrets.is_empty() {
        return Ok(());
    }

    let mut group_deps = vec![database.clone()];
    if !secrets.skip_secrets_manager_auth_policy {
        let gate = gate_policy(
            graph,
            "secrets_manager",
            AuthorizationPolicy::secrets_manager_write(secrets_manager.guid())
                .into_declaration()
                .bind("target_resource_instance_id", database, "guid"),
            vec![database.clone()],
            inputs.config.settling_delay(),
        )?;
        group_deps.push(gate.settled);
    }

    for group in &secrets.service_credential_secrets {
        graph.push(
            ResourceAddress::keyed("secret_group", INSTANCE_LABEL, &group.secret_group_name),
            StepAction::MirrorSecrets(SecretGroupDeclaration {
                group_name: group.secret_group_name.clone(),
                description: group.secret_group_description.clone(),
                existing_group: group.existing_secret_group,
                secrets_manager_crn: secrets_manager.to_string(),
                source_instance: database.clone(),
                secrets: group.service_credentials.clone(),
            }),
            group_deps.clone(),
        )?;
    }

    Ok(())
}
