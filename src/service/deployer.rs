// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment Service
//!
//! Runs one deployment end to end:
//!
//! ```text
//! validate ─> resolve encryption ─> select topology ─> compose graph
//!     ─> execute graph ─> harvest credentials ─> (activate model)
//! ```
//!
//! The gate runs first; a rejected configuration declares nothing. Every
//! run executes inside an `info_span!("deploy")` carrying a v7 run id.

use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::activation::{activate_model, ActivationEnv, ModelActivator};
use super::kms::resolve_encryption;
use super::settle::{FixedDelay, SettleStrategy};
use crate::backend::{
    InMemoryBackend, KeyProvisioner, ProvisioningBackend, SecretHandle, SecretStore,
};
use crate::config::DeploymentConfig;
use crate::domain::credentials::{
    activation_connection_string, build_connection, resolve_admin_credentials, ConnectionInfo,
    Endpoint, ServiceCredentialSecret,
};
use crate::domain::crn::Crn;
use crate::domain::encryption::EncryptionPlan;
use crate::domain::invariants::validate_configuration;
use crate::domain::resource::{ResolvedAttributes, ResourceAddress, ResourceKind};
use crate::domain::topology::{select_topology, ClusterTopology};
use crate::errors::{DeploymentError, DeploymentResult};
use crate::graph::compose::INSTANCE_LABEL;
use crate::graph::{compose_graph, CompositionInputs, DeploymentGraph, ExecutionReport, GraphExecutor};

/// Everything resolved before execution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentPlan {
    pub encryption: EncryptionPlan,
    pub topology: ClusterTopology,
    pub graph: DeploymentGraph,
}

/// Result of a completed deployment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentOutputs {
    pub run_id: Uuid,
    pub id: String,
    pub guid: String,
    pub crn: String,
    pub version: String,
    pub hostname: String,
    pub port: u16,
    pub certificate_base64: String,
    pub context_rule_ids: Vec<String>,
    /// Canonical connection; `None` when no credentials were requested
    pub connection: Option<ConnectionInfo>,
    pub secret_handles: Vec<SecretHandle>,
    pub encryption: EncryptionPlan,
    pub topology: ClusterTopology,
    pub model_activated: bool,
}

/// Orchestrates resolution, execution and activation
#[derive(Clone)]
pub struct Deployer {
    backend: Arc<dyn ProvisioningBackend>,
    keys: Arc<dyn KeyProvisioner>,
    secrets: Arc<dyn SecretStore>,
    settler: Arc<dyn SettleStrategy>,
    activator: Arc<dyn ModelActivator>,
}

impl Deployer {
    /// Deployer waiting out settle steps with [`FixedDelay`]
    pub fn new(
        backend: Arc<dyn ProvisioningBackend>,
        keys: Arc<dyn KeyProvisioner>,
        secrets: Arc<dyn SecretStore>,
        activator: Arc<dyn ModelActivator>,
    ) -> Self {
        Self {
            backend,
            keys,
            secrets,
            settler: Arc::new(FixedDelay),
            activator,
        }
    }

    /// Every collaborator backed by one in-memory backend; settling is instant
    pub fn in_memory(backend: InMemoryBackend) -> Self {
        let shared = Arc::new(backend);
        Self {
            backend: shared.clone(),
            keys: shared.clone(),
            secrets: shared.clone(),
            settler: shared.clone(),
            activator: shared,
        }
    }

    pub fn with_key_provisioner(mut self, keys: Arc<dyn KeyProvisioner>) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_settle_strategy(mut self, settler: Arc<dyn SettleStrategy>) -> Self {
        self.settler = settler;
        self
    }

    pub fn with_activator(mut self, activator: Arc<dyn ModelActivator>) -> Self {
        self.activator = activator;
        self
    }

    /// Gate, resolve and compose without executing the graph
    pub async fn plan(&self, config: &DeploymentConfig) -> DeploymentResult<DeploymentPlan> {
        if let Err(errors) = validate_configuration(config) {
            error!(failures = errors.errors().len(), "Configuration rejected");
            return Err(errors.into());
        }
        info!("Configuration accepted");

        let encryption = resolve_encryption(config, self.keys.as_ref()).await?;

        let topology = select_topology(config.topology.host_flavor.as_deref(), &config.topology.sizing);
        info!(topology = %topology, auto_scaling = config.topology.auto_scaling.is_some(), "Topology selected");

        let secrets_manager = config
            .secrets
            .existing_secrets_manager_instance_crn
            .as_deref()
            .map(Crn::parse)
            .transpose()?;

        let graph = compose_graph(&CompositionInputs {
            config,
            encryption: &encryption,
            topology: &topology,
            secrets_manager: secrets_manager.as_ref(),
        })?;
        info!(steps = graph.len(), "Deployment graph composed");

        Ok(DeploymentPlan {
            encryption,
            topology,
            graph,
        })
    }

    /// Run a full deployment
    pub async fn deploy(&self, config: &DeploymentConfig) -> DeploymentResult<DeploymentOutputs> {
        let run_id = Uuid::now_v7();
        let span = info_span!("deploy", %run_id, instance = %config.instance_name());
        self.run(run_id, config).instrument(span).await
    }

    async fn run(&self, run_id: Uuid, config: &DeploymentConfig) -> DeploymentResult<DeploymentOutputs> {
        let plan = self.plan(config).await?;

        let report = GraphExecutor::new(
            self.backend.as_ref(),
            self.settler.as_ref(),
            self.secrets.as_ref(),
        )
        .execute(&plan.graph)
        .await
        .into_result()?;

        let database = ResourceAddress::single(ResourceKind::DatabaseInstance.as_str(), INSTANCE_LABEL);
        let instance = report
            .get(&database)
            .ok_or_else(|| DeploymentError::UnexpectedAttributes {
                address: database.clone(),
                message: "cluster did not resolve".to_string(),
            })?;

        let connection = harvest_connection(config, &report, &database)?;
        let endpoint = instance_endpoint(&database, instance)?;

        let model_activated = if config.model_activation.enabled {
            self.activate(config, connection.as_ref(), &endpoint).await?
        } else {
            false
        };

        let outputs = DeploymentOutputs {
            run_id,
            id: required_str(&database, instance, "id")?,
            guid: required_str(&database, instance, "guid")?,
            crn: required_str(&database, instance, "crn")?,
            version: required_str(&database, instance, "version")?,
            hostname: endpoint.hostname,
            port: endpoint.port,
            certificate_base64: required_str(&database, instance, "certificate_base64")?,
            context_rule_ids: report
                .of_kind(ResourceKind::ContextRule)
                .filter_map(|rule| rule.attributes.get_str("id").map(str::to_string))
                .collect(),
            connection,
            secret_handles: report.secret_handles,
            encryption: plan.encryption,
            topology: plan.topology,
            model_activated,
        };

        info!(crn = %outputs.crn, model_activated, "Deployment complete");
        Ok(outputs)
    }

    async fn activate(
        &self,
        config: &DeploymentConfig,
        connection: Option<&ConnectionInfo>,
        instance_endpoint: &Endpoint,
    ) -> DeploymentResult<bool> {
        let admin = resolve_admin_credentials(
            &config.service_credential_names,
            connection,
            config.admin_pass.as_deref(),
        );
        let endpoint = connection
            .map(|connection| &connection.endpoint)
            .unwrap_or(instance_endpoint);

        let Some(connection_string) = admin
            .as_ref()
            .and_then(|admin| activation_connection_string(admin, endpoint))
        else {
            warn!("Administrator credentials unresolved, model activation skipped");
            return Ok(false);
        };

        let env = ActivationEnv {
            connection_string,
            model_type: config.model_activation.model_type.clone(),
        };
        activate_model(self.activator.as_ref(), &env).await?;
        info!(model_type = %env.model_type, "Model activated");
        Ok(true)
    }
}

fn harvest_connection(
    config: &DeploymentConfig,
    report: &ExecutionReport,
    database: &ResourceAddress,
) -> DeploymentResult<Option<ConnectionInfo>> {
    let bundle = &config.service_credential_names;

    let secrets = bundle
        .iter()
        .map(|request| {
            let address = ResourceAddress::keyed(
                ResourceKind::ServiceCredential.as_str(),
                INSTANCE_LABEL,
                &request.name,
            );
            let payload = report
                .get(&address)
                .and_then(|attributes| attributes.get("credentials"))
                .cloned()
                .ok_or_else(|| DeploymentError::UnexpectedAttributes {
                    address: address.clone(),
                    message: "no credentials attribute".to_string(),
                })?;
            let secret: ServiceCredentialSecret =
                serde_json::from_value(payload).map_err(|e| DeploymentError::UnexpectedAttributes {
                    address: address.clone(),
                    message: e.to_string(),
                })?;
            Ok((request.name.clone(), secret))
        })
        .collect::<DeploymentResult<Vec<_>>>()?;

    build_connection(bundle, &secrets).map_err(|e| DeploymentError::UnexpectedAttributes {
        address: database.clone(),
        message: e.to_string(),
    })
}

fn instance_endpoint(address: &ResourceAddress, instance: &ResolvedAttributes) -> DeploymentResult<Endpoint> {
    let port = instance
        .get_u64("port")
        .and_then(|port| u16::try_from(port).ok())
        .ok_or_else(|| DeploymentError::UnexpectedAttributes {
            address: address.clone(),
            message: "missing or out-of-range `port`".to_string(),
        })?;

    Ok(Endpoint {
        scheme: instance.get_str("scheme").unwrap_or("https").to_string(),
        hostname: required_str(address, instance, "hostname")?,
        port,
    })
}

fn required_str(
    address: &ResourceAddress,
    attributes: &ResolvedAttributes,
    name: &str,
) -> DeploymentResult<String> {
    attributes
        .get_str(name)
        .map(str::to_string)
        .ok_or_else(|| DeploymentError::UnexpectedAttributes {
            address: address.clone(),
            message: format!("missing `{}`", name),
        })
}
