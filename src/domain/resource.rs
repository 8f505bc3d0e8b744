// Copyright (c) 2025 - Cowboy AI, Inc.
//! Declared Resource Vocabulary
//!
//! Resource kinds the composer declares, their graph addresses, and the
//! replace-versus-update rule for attributes that are immutable after
//! creation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Kind of resource handed to the provisioning backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    ResourceGroup,
    AuthorizationPolicy,
    DatabaseInstance,
    AccessTag,
    ContextRule,
    ServiceCredential,
}

impl ResourceKind {
    /// Canonical string representation, also the address prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResourceGroup => "resource_group",
            Self::AuthorizationPolicy => "authorization_policy",
            Self::DatabaseInstance => "database",
            Self::AccessTag => "access_tag",
            Self::ContextRule => "context_rule",
            Self::ServiceCredential => "service_credential",
        }
    }

    /// Attributes whose change forces destroy-and-recreate
    pub fn immutable_attributes(&self) -> &'static [&'static str] {
        match self {
            Self::DatabaseInstance => &[
                "version",
                "key_protect_key",
                "backup_encryption_key_crn",
                "backup_id",
            ],
            Self::ServiceCredential => &["role", "resource_instance_id", "endpoint_type"],
            Self::AuthorizationPolicy => &[
                "source_service_name",
                "target_service_name",
                "target_resource_instance_id",
            ],
            Self::ResourceGroup | Self::AccessTag | Self::ContextRule => &[],
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of a step in the deployment graph
///
/// `database.search`, `context_rule.search[2]`,
/// `service_credential.search["admin1"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceAddress(String);

impl ResourceAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn single(prefix: &str, name: &str) -> Self {
        Self(format!("{}.{}", prefix, name))
    }

    pub fn indexed(prefix: &str, name: &str, index: usize) -> Self {
        Self(format!("{}.{}[{}]", prefix, name, index))
    }

    pub fn keyed(prefix: &str, name: &str, key: &str) -> Self {
        Self(format!("{}.{}[\"{}\"]", prefix, name, key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceAddress {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

/// Attributes returned by the backend for a declared resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedAttributes(Map<String, Value>);

impl ResolvedAttributes {
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self(attributes)
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.0.get(attribute)
    }

    pub fn get_str(&self, attribute: &str) -> Option<&str> {
        self.0.get(attribute).and_then(Value::as_str)
    }

    pub fn get_u64(&self, attribute: &str) -> Option<u64> {
        self.0.get(attribute).and_then(Value::as_u64)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for ResolvedAttributes {
    fn from(attributes: Map<String, Value>) -> Self {
        Self(attributes)
    }
}

/// What the backend has to do to reach a desired attribute set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeAction {
    Create,
    NoOp,
    Update { changed: Vec<String> },
    Replace { immutable: Vec<String> },
}

/// Compare previous and desired attributes of one resource
pub fn plan_change(
    kind: ResourceKind,
    previous: Option<&Map<String, Value>>,
    desired: &Map<String, Value>,
) -> ChangeAction {
    let Some(previous) = previous else {
        return ChangeAction::Create;
    };

    let mut keys: Vec<&String> = previous.keys().chain(desired.keys()).collect();
    keys.sort();
    keys.dedup();

    let changed: Vec<String> = keys
        .into_iter()
        .filter(|key| previous.get(key.as_str()) != desired.get(key.as_str()))
        .cloned()
        .collect();

    if changed.is_empty() {
        return ChangeAction::NoOp;
    }

    let immutable: Vec<String> = changed
        .iter()
        .filter(|key| kind.immutable_attributes().contains(&key.as_str()))
        .cloned()
        .collect();

    if immutable.is_empty() {
        ChangeAction::Update { changed }
    } else {
        ChangeAction::Replace { immutable }
    }
}
