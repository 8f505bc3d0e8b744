// Copyright (c) 2025 - Cowboy AI, Inc.
//! External Collaborator Contracts
//!
//! Everything that touches a real cloud goes through one of these traits.
//! The resolution logic only ever "declares desired state and receives
//! resolved attributes"; creation, retries and state storage belong to the
//! implementation behind the trait.
//!
//! # Contracts
//!
//! - [`ProvisioningBackend`] - declare one resource, get its attributes back
//! - [`KeyProvisioner`] - ensure a key ring and key exist in a KMS instance
//! - [`SecretStore`] - mirror generated credentials into secret groups
//!
//! Settling and model activation have their own seams in
//! [`crate::service::settle`] and [`crate::service::activation`].
//!
//! # Implementations
//!
//! - [`memory::InMemoryBackend`] - deterministic, with failure injection
//! - [`deferred::DeferredKeyProvisioner`] - placeholder keys for planning
//! - [`script::ScriptActivator`] - runs the activation scripts

pub mod deferred;
pub mod memory;
pub mod script;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::resource::{ResolvedAttributes, ResourceAddress, ResourceKind};
use crate::errors::ProvisioningError;
use crate::graph::SecretGroupDeclaration;

pub use deferred::DeferredKeyProvisioner;
pub use memory::{InMemoryBackend, JournalEntry, JournalEvent};
pub use script::ScriptActivator;

/// Declares desired resources and returns their resolved attributes
///
/// Implementations must be idempotent per address: declaring the same
/// address twice with the same attributes is a no-op that returns the same
/// resolved attributes.
#[async_trait]
pub trait ProvisioningBackend: Send + Sync {
    /// Create or converge one resource
    ///
    /// `desired` already has every attribute binding applied.
    async fn declare(
        &self,
        address: &ResourceAddress,
        kind: ResourceKind,
        desired: &Map<String, Value>,
    ) -> Result<ResolvedAttributes, ProvisioningError>;

    /// Backend name used in logs
    fn name(&self) -> &str;
}

/// Key ring and key to ensure inside an existing KMS instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRequest {
    /// Service of the KMS instance (`kms` or `hs-crypto`)
    pub service_name: String,
    pub instance_guid: String,
    pub region: String,
    pub ring_name: String,
    pub key_name: String,
    pub rotation_interval_months: u8,
    pub standard_key: bool,
}

#[async_trait]
pub trait KeyProvisioner: Send + Sync {
    /// Ensure the key exists and return its CRN; idempotent by ring and key name
    async fn ensure_key(&self, request: &KeyRequest) -> Result<String, ProvisioningError>;
}

/// Secret group ready to be mirrored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSecretGroup {
    pub address: ResourceAddress,
    pub declaration: SecretGroupDeclaration,
    /// CRN of the cluster whose credentials are mirrored
    pub source_instance_crn: String,
}

/// Mirrored secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretHandle {
    pub group_name: String,
    pub secret_name: String,
    pub secret_id: String,
}

#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Mirror every secret of one group, creating the group unless it exists
    async fn mirror_group(
        &self,
        group: &ResolvedSecretGroup,
    ) -> Result<Vec<SecretHandle>, ProvisioningError>;
}
