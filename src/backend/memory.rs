// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-Memory Backend
//!
//! Deterministic implementation of every collaborator contract. Identifiers
//! come from a counter, so two runs over the same graph produce the same
//! attributes. Redeclaring an address applies the replace-versus-update
//! rule: an immutable attribute change yields a fresh identity, any other
//! change keeps it.
//!
//! Failures are injected per address with [`InMemoryBackend::fail_on`] and
//! per activation stage with [`InMemoryBackend::fail_activation`]. Every
//! call is journaled with a timestamp.
//!
//! This is ephemeral - state does not persist across restarts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{
    KeyProvisioner, KeyRequest, ProvisioningBackend, ResolvedSecretGroup, SecretHandle, SecretStore,
};
use crate::domain::resource::{plan_change, ChangeAction, ResolvedAttributes, ResourceAddress, ResourceKind};
use crate::errors::ProvisioningError;
use crate::graph::SettleStep;
use crate::service::activation::{ActivationEnv, ActivationError, ActivationStage, ModelActivator};
use crate::service::settle::SettleStrategy;

const DEFAULT_ACCOUNT_ID: &str = "0123456789abcdef0123456789abcdef";
const DEFAULT_DATABASE_VERSION: &str = "8.15";
const BASE_PORT: u64 = 31000;

/// What happened, in call order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JournalEvent {
    Declared {
        address: ResourceAddress,
        kind: ResourceKind,
        change: String,
    },
    KeyEnsured {
        ring_name: String,
        key_name: String,
        created: bool,
    },
    Settled {
        policy: ResourceAddress,
    },
    Mirrored {
        group_name: String,
        secrets: usize,
    },
    ModelInstalled {
        model_type: String,
    },
    ModelStarted {
        model_type: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: JournalEvent,
}

#[derive(Debug, Clone)]
struct StoredResource {
    kind: ResourceKind,
    desired: Map<String, Value>,
    resolved: ResolvedAttributes,
    sequence: u64,
}

#[derive(Debug, Default)]
struct State {
    resources: BTreeMap<ResourceAddress, StoredResource>,
    keys: BTreeMap<(String, String, String), String>,
    secret_groups: BTreeMap<String, String>,
    failures: HashMap<ResourceAddress, String>,
    activation_failures: HashMap<String, String>,
    journal: Vec<JournalEntry>,
    sequence: u64,
}

impl State {
    fn next(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    fn record(&mut self, event: JournalEvent) {
        self.journal.push(JournalEntry {
            at: Utc::now(),
            event,
        });
    }

    fn injected(&self, address: &ResourceAddress) -> Result<(), ProvisioningError> {
        match self.failures.get(address) {
            Some(message) => Err(ProvisioningError::new(address.clone(), message.clone())),
            None => Ok(()),
        }
    }
}

/// Shared in-memory provisioning, key, secret and activation backend
#[derive(Clone, Debug)]
pub struct InMemoryBackend {
    account_id: String,
    state: Arc<RwLock<State>>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::with_account(DEFAULT_ACCOUNT_ID)
    }

    pub fn with_account(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            state: Arc::new(RwLock::new(State::default())),
        }
    }

    /// Make every later call for `address` fail with `message`
    pub async fn fail_on(&self, address: ResourceAddress, message: impl Into<String>) {
        self.state.write().await.failures.insert(address, message.into());
    }

    pub async fn fail_activation(&self, stage: ActivationStage, message: impl Into<String>) {
        self.state
            .write()
            .await
            .activation_failures
            .insert(stage.to_string(), message.into());
    }

    /// Attributes last declared for `address`, bindings applied
    pub async fn desired(&self, address: &ResourceAddress) -> Option<Map<String, Value>> {
        self.state
            .read()
            .await
            .resources
            .get(address)
            .map(|resource| resource.desired.clone())
    }

    pub async fn resolved(&self, address: &ResourceAddress) -> Option<ResolvedAttributes> {
        self.state
            .read()
            .await
            .resources
            .get(address)
            .map(|resource| resource.resolved.clone())
    }

    pub async fn resource_count(&self) -> usize {
        self.state.read().await.resources.len()
    }

    pub async fn journal(&self) -> Vec<JournalEntry> {
        self.state.read().await.journal.clone()
    }

    pub async fn events(&self) -> Vec<JournalEvent> {
        self.state
            .read()
            .await
            .journal
            .iter()
            .map(|entry| entry.event.clone())
            .collect()
    }

    fn guid(sequence: u64) -> String {
        Uuid::from_u128(u128::from(sequence)).to_string()
    }

    fn crn(&self, service: &str, region: &str, guid: &str, resource: Option<(&str, &str)>) -> String {
        let (resource_type, resource_id) = resource.unwrap_or(("", ""));
        format!(
            "crn:v1:bluemix:public:{}:{}:a/{}:{}:{}:{}",
            service, region, self.account_id, guid, resource_type, resource_id
        )
    }

    fn resolve(
        &self,
        state: &State,
        address: &ResourceAddress,
        kind: ResourceKind,
        desired: &Map<String, Value>,
        sequence: u64,
    ) -> Result<ResolvedAttributes, ProvisioningError> {
        let mut attributes = desired.clone();
        let guid = Self::guid(sequence);
        let region = desired
            .get("location")
            .and_then(Value::as_str)
            .unwrap_or("us-south");

        match kind {
            ResourceKind::DatabaseInstance => {
                let service = desired
                    .get("service")
                    .and_then(Value::as_str)
                    .unwrap_or("databases-for-elasticsearch");
                let crn = self.crn(service, region, &guid, None);
                let version = desired
                    .get("version")
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_DATABASE_VERSION);

                attributes.insert("id".to_string(), Value::from(crn.as_str()));
                attributes.insert("crn".to_string(), Value::from(crn));
                attributes.insert("guid".to_string(), Value::from(guid.as_str()));
                attributes.insert("version".to_string(), Value::from(version));
                attributes.insert("scheme".to_string(), Value::from("https"));
                attributes.insert(
                    "hostname".to_string(),
                    Value::from(format!("{}.databases.appdomain.cloud", guid)),
                );
                attributes.insert("port".to_string(), Value::from(BASE_PORT + sequence));
                attributes.insert(
                    "certificate_base64".to_string(),
                    Value::from(format!("certificate-{}", guid)),
                );
            }
            ResourceKind::ServiceCredential => {
                let instance_id = desired
                    .get("resource_instance_id")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                let instance = state
                    .resources
                    .values()
                    .find(|resource| resource.resolved.get_str("id") == Some(instance_id))
                    .ok_or_else(|| {
                        ProvisioningError::new(
                            address.clone(),
                            format!("unknown resource instance `{}`", instance_id),
                        )
                    })?;
                let name = desired.get("name").and_then(Value::as_str).unwrap_or("credential");

                attributes.insert("id".to_string(), Value::from(format!("credential-{}", guid)));
                attributes.insert(
                    "credentials".to_string(),
                    json!({
                        "connection": {
                            "https": {
                                "scheme": instance.resolved.get_str("scheme").unwrap_or("https"),
                                "hosts": [{
                                    "hostname": instance.resolved.get_str("hostname").unwrap_or_default(),
                                    "port": instance.resolved.get_u64("port").unwrap_or(BASE_PORT),
                                }],
                                "certificate": {
                                    "certificate_base64": instance.resolved.get_str("certificate_base64").unwrap_or_default(),
                                },
                                "authentication": {
                                    "username": format!("ibm_cloud_{}", name),
                                    "password": format!("{}-{}", name, guid),
                                },
                            }
                        }
                    }),
                );
            }
            ResourceKind::ResourceGroup => {
                attributes.insert("id".to_string(), Value::from(format!("rg-{}", guid)));
            }
            ResourceKind::AuthorizationPolicy
            | ResourceKind::AccessTag
            | ResourceKind::ContextRule => {
                attributes.insert(
                    "id".to_string(),
                    Value::from(format!("{}-{}", kind.as_str(), guid)),
                );
            }
        }

        Ok(attributes.into())
    }
}

#[async_trait]
impl ProvisioningBackend for InMemoryBackend {
    async fn declare(
        &self,
        address: &ResourceAddress,
        kind: ResourceKind,
        desired: &Map<String, Value>,
    ) -> Result<ResolvedAttributes, ProvisioningError> {
        let mut state = self.state.write().await;
        state.injected(address)?;

        let previous = state.resources.get(address).cloned();
        let change = plan_change(kind, previous.as_ref().map(|p| &p.desired), desired);
        debug!(address = %address, change = ?change, "In-memory declare");

        let resolved = match (&change, previous) {
            (ChangeAction::NoOp, Some(previous)) => previous.resolved,
            (ChangeAction::Update { .. }, Some(previous)) => {
                let resolved = self.resolve(&state, address, kind, desired, previous.sequence)?;
                state.resources.insert(
                    address.clone(),
                    StoredResource {
                        kind,
                        desired: desired.clone(),
                        resolved: resolved.clone(),
                        sequence: previous.sequence,
                    },
                );
                resolved
            }
            _ => {
                let sequence = state.next();
                let resolved = self.resolve(&state, address, kind, desired, sequence)?;
                state.resources.insert(
                    address.clone(),
                    StoredResource {
                        kind,
                        desired: desired.clone(),
                        resolved: resolved.clone(),
                        sequence,
                    },
                );
                resolved
            }
        };

        state.record(JournalEvent::Declared {
            address: address.clone(),
            kind,
            change: change_label(&change).to_string(),
        });
        Ok(resolved)
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

fn change_label(change: &ChangeAction) -> &'static str {
    match change {
        ChangeAction::Create => "create",
        ChangeAction::NoOp => "no-op",
        ChangeAction::Update { .. } => "update",
        ChangeAction::Replace { .. } => "replace",
    }
}

#[async_trait]
impl KeyProvisioner for InMemoryBackend {
    async fn ensure_key(&self, request: &KeyRequest) -> Result<String, ProvisioningError> {
        let address = ResourceAddress::keyed("kms_key", &request.ring_name, &request.key_name);
        let mut state = self.state.write().await;
        state.injected(&address)?;

        let lookup = (
            request.instance_guid.clone(),
            request.ring_name.clone(),
            request.key_name.clone(),
        );
        let (crn, created) = match state.keys.get(&lookup) {
            Some(crn) => (crn.clone(), false),
            None => {
                let key_id = Self::guid(state.next());
                let crn = self.crn(
                    &request.service_name,
                    &request.region,
                    &request.instance_guid,
                    Some(("key", &key_id)),
                );
                state.keys.insert(lookup, crn.clone());
                (crn, true)
            }
        };

        state.record(JournalEvent::KeyEnsured {
            ring_name: request.ring_name.clone(),
            key_name: request.key_name.clone(),
            created,
        });
        Ok(crn)
    }
}

#[async_trait]
impl SecretStore for InMemoryBackend {
    async fn mirror_group(
        &self,
        group: &ResolvedSecretGroup,
    ) -> Result<Vec<SecretHandle>, ProvisioningError> {
        let mut state = self.state.write().await;
        state.injected(&group.address)?;

        let declaration = &group.declaration;
        if !state.secret_groups.contains_key(&declaration.group_name) {
            let group_id = Self::guid(state.next());
            state
                .secret_groups
                .insert(declaration.group_name.clone(), group_id);
        }

        let mut handles = Vec::with_capacity(declaration.secrets.len());
        for secret in &declaration.secrets {
            let secret_id = Self::guid(state.next());
            handles.push(SecretHandle {
                group_name: declaration.group_name.clone(),
                secret_name: secret.secret_name.clone(),
                secret_id,
            });
        }

        state.record(JournalEvent::Mirrored {
            group_name: declaration.group_name.clone(),
            secrets: handles.len(),
        });
        Ok(handles)
    }
}

#[async_trait]
impl SettleStrategy for InMemoryBackend {
    async fn settle(&self, step: &SettleStep) -> Result<(), ProvisioningError> {
        self.state.write().await.record(JournalEvent::Settled {
            policy: step.policy.clone(),
        });
        Ok(())
    }
}

impl InMemoryBackend {
    async fn activation_step(
        &self,
        stage: ActivationStage,
        env: &ActivationEnv,
    ) -> Result<(), ActivationError> {
        let mut state = self.state.write().await;
        if let Some(message) = state.activation_failures.get(&stage.to_string()) {
            return Err(ActivationError::StepFailed {
                stage,
                message: message.clone(),
            });
        }

        let model_type = env.model_type.clone();
        state.record(match stage {
            ActivationStage::Install => JournalEvent::ModelInstalled { model_type },
            ActivationStage::Start => JournalEvent::ModelStarted { model_type },
        });
        Ok(())
    }
}

#[async_trait]
impl ModelActivator for InMemoryBackend {
    async fn install_model(&self, env: &ActivationEnv) -> Result<(), ActivationError> {
        self.activation_step(ActivationStage::Install, env).await
    }

    async fn start_model(&self, env: &ActivationEnv) -> Result<(), ActivationError> {
        self.activation_step(ActivationStage::Start, env).await
    }
}
