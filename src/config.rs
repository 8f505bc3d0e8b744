// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment Configuration Input
//!
//! A single immutable record describing what the caller wants deployed. It is
//! loaded once (JSON file plus environment overrides), checked by the
//! validation gate, and then passed by reference into every resolver.
//!
//! # Environment Overrides
//!
//! | Variable                     | Field                                   |
//! |------------------------------|-----------------------------------------|
//! | `SEARCH_DEPLOY_REGION`       | `region`                                |
//! | `SEARCH_DEPLOY_PREFIX`       | `prefix`                                |
//! | `SEARCH_DEPLOY_KMS_API_KEY`  | `encryption.ibmcloud_kms_api_key`       |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::domain::credentials::{CredentialBundle, CredentialRole};
use crate::domain::topology::{AutoScalingPolicy, MemberSizing};

/// Default settling delay after an authorization policy is created
pub const DEFAULT_SETTLING_DELAY_SECS: u64 = 30;

/// Errors loading the configuration
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Service plan tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServicePlan {
    Standard,
    Enterprise,
    Platinum,
}

impl ServicePlan {
    /// Tier required for model activation
    pub const PREMIUM: ServicePlan = ServicePlan::Platinum;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Enterprise => "enterprise",
            Self::Platinum => "platinum",
        }
    }
}

impl fmt::Display for ServicePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Network endpoints exposed by the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceEndpoints {
    Public,
    Private,
    PublicAndPrivate,
}

impl ServiceEndpoints {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::PublicAndPrivate => "public-and-private",
        }
    }

    /// Endpoint type generated credentials should point at
    pub fn credential_endpoint_type(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private | Self::PublicAndPrivate => "private",
        }
    }
}

/// Encryption inputs
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncryptionConfig {
    /// Encrypt with a customer-managed key instead of a provider-owned one
    pub kms_encryption_enabled: bool,
    /// Primary key CRN; when unset a key is provisioned in the KMS instance
    pub kms_key_crn: Option<String>,
    pub backup_encryption_key_crn: Option<String>,
    pub use_default_backup_encryption_key: bool,
    pub existing_kms_instance_crn: Option<String>,
    pub skip_iam_authorization_policy: bool,
    /// Credential for the account owning the KMS instance
    pub ibmcloud_kms_api_key: Option<String>,
    pub key_ring_name: String,
    pub key_name: String,
    pub key_rotation_interval_months: u8,
    /// Standard key instead of a root key
    pub standard_key: bool,
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            kms_encryption_enabled: false,
            kms_key_crn: None,
            backup_encryption_key_crn: None,
            use_default_backup_encryption_key: false,
            existing_kms_instance_crn: None,
            skip_iam_authorization_policy: false,
            ibmcloud_kms_api_key: None,
            key_ring_name: "elasticsearch-key-ring".to_string(),
            key_name: "elasticsearch-key".to_string(),
            key_rotation_interval_months: 3,
            standard_key: false,
        }
    }
}

impl fmt::Debug for EncryptionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionConfig")
            .field("kms_encryption_enabled", &self.kms_encryption_enabled)
            .field("kms_key_crn", &self.kms_key_crn)
            .field("backup_encryption_key_crn", &self.backup_encryption_key_crn)
            .field(
                "use_default_backup_encryption_key",
                &self.use_default_backup_encryption_key,
            )
            .field("existing_kms_instance_crn", &self.existing_kms_instance_crn)
            .field("skip_iam_authorization_policy", &self.skip_iam_authorization_policy)
            .field(
                "ibmcloud_kms_api_key",
                &self.ibmcloud_kms_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("key_ring_name", &self.key_ring_name)
            .field("key_name", &self.key_name)
            .field("key_rotation_interval_months", &self.key_rotation_interval_months)
            .field("standard_key", &self.standard_key)
            .finish()
    }
}

/// Member group inputs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    pub host_flavor: Option<String>,
    #[serde(flatten)]
    pub sizing: MemberSizing,
    pub auto_scaling: Option<AutoScalingPolicy>,
}

/// Enforcement of a context-based restriction rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnforcementMode {
    #[default]
    Enabled,
    Disabled,
    Report,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleAttribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleContext {
    pub attributes: Vec<RuleAttribute>,
}

/// One context-based restriction rule scoped to the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRuleSpec {
    pub description: String,
    pub account_id: String,
    #[serde(default)]
    pub rule_contexts: Vec<RuleContext>,
    #[serde(default)]
    pub enforcement_mode: EnforcementMode,
}

/// One secret mirrored into the secret store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretSpec {
    pub secret_name: String,
    pub service_credentials_source_service_role: CredentialRole,
    #[serde(default)]
    pub secret_labels: Vec<String>,
    #[serde(default)]
    pub secret_auto_rotation: bool,
    #[serde(default = "default_rotation_interval")]
    pub secret_auto_rotation_interval: u32,
}

fn default_rotation_interval() -> u32 {
    89
}

/// Named group of mirrored secrets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretGroupSpec {
    pub secret_group_name: String,
    #[serde(default)]
    pub secret_group_description: Option<String>,
    #[serde(default)]
    pub existing_secret_group: bool,
    pub service_credentials: Vec<SecretSpec>,
}

/// Secret store inputs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    pub existing_secrets_manager_instance_crn: Option<String>,
    pub skip_secrets_manager_auth_policy: bool,
    pub service_credential_secrets: Vec<SecretGroupSpec>,
}

/// Model activation inputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelActivationConfig {
    pub enabled: bool,
    pub model_type: String,
}

impl Default for ModelActivationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model_type: ".elser_model_2_linux-x86_64".to_string(),
        }
    }
}

/// Complete deployment input
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    pub name: String,
    pub prefix: Option<String>,
    pub region: String,
    pub plan: ServicePlan,
    pub version: Option<String>,
    pub service_endpoints: ServiceEndpoints,
    pub resource_group_id: Option<String>,
    pub resource_group_name: Option<String>,
    pub tags: Vec<String>,
    pub access_tags: Vec<String>,
    pub admin_pass: Option<String>,
    /// Backup to restore the new cluster from
    pub backup_crn: Option<String>,
    pub encryption: EncryptionConfig,
    pub topology: TopologyConfig,
    pub service_credential_names: CredentialBundle,
    pub cbr_rules: Vec<ContextRuleSpec>,
    pub secrets: SecretsConfig,
    pub model_activation: ModelActivationConfig,
    pub settling_delay_secs: u64,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            name: "search".to_string(),
            prefix: None,
            region: "us-south".to_string(),
            plan: ServicePlan::Enterprise,
            version: None,
            service_endpoints: ServiceEndpoints::Private,
            resource_group_id: None,
            resource_group_name: None,
            tags: Vec::new(),
            access_tags: Vec::new(),
            admin_pass: None,
            backup_crn: None,
            encryption: EncryptionConfig::default(),
            topology: TopologyConfig::default(),
            service_credential_names: CredentialBundle::default(),
            cbr_rules: Vec::new(),
            secrets: SecretsConfig::default(),
            model_activation: ModelActivationConfig::default(),
            settling_delay_secs: DEFAULT_SETTLING_DELAY_SECS,
        }
    }
}

impl fmt::Debug for DeploymentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentConfig")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("region", &self.region)
            .field("plan", &self.plan)
            .field("version", &self.version)
            .field("service_endpoints", &self.service_endpoints)
            .field("resource_group_id", &self.resource_group_id)
            .field("resource_group_name", &self.resource_group_name)
            .field("tags", &self.tags)
            .field("access_tags", &self.access_tags)
            .field("admin_pass", &self.admin_pass.as_ref().map(|_| "<redacted>"))
            .field("backup_crn", &self.backup_crn)
            .field("encryption", &self.encryption)
            .field("topology", &self.topology)
            .field("service_credential_names", &self.service_credential_names)
            .field("cbr_rules", &self.cbr_rules)
            .field("secrets", &self.secrets)
            .field("model_activation", &self.model_activation)
            .field("settling_delay_secs", &self.settling_delay_secs)
            .finish()
    }
}

impl DeploymentConfig {
    pub fn from_json_str(document: &str) -> Result<Self, ConfigLoadError> {
        Ok(serde_json::from_str(document)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&document)
    }

    /// Apply `SEARCH_DEPLOY_*` overrides from the process environment
    pub fn apply_env_overrides(self) -> Self {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(region) = lookup("SEARCH_DEPLOY_REGION") {
            self.region = region;
        }
        if let Some(prefix) = lookup("SEARCH_DEPLOY_PREFIX") {
            self.prefix = Some(prefix);
        }
        if let Some(api_key) = lookup("SEARCH_DEPLOY_KMS_API_KEY") {
            self.encryption.ibmcloud_kms_api_key = Some(api_key);
        }
        self
    }

    /// Name with the optional prefix applied
    pub fn prefixed(&self, name: &str) -> String {
        match self.prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => format!("{}-{}", prefix, name),
            _ => name.to_string(),
        }
    }

    /// Cluster instance name
    pub fn instance_name(&self) -> String {
        self.prefixed(&self.name)
    }

    pub fn settling_delay(&self) -> Duration {
        Duration::from_secs(self.settling_delay_secs)
    }
}
