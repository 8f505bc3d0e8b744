// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for search-cluster-infrastructure
//!
//! Deterministic configurations and identifiers shared by the integration
//! suites. Tests build on these instead of spelling out full configurations.

#![allow(dead_code)]

use search_cluster_infrastructure::config::{
    ContextRuleSpec, EnforcementMode, RuleAttribute, RuleContext, SecretGroupSpec, SecretSpec,
    ServicePlan,
};
use search_cluster_infrastructure::domain::{CredentialBundle, CredentialRole};
use search_cluster_infrastructure::DeploymentConfig;

pub const RESOURCE_GROUP_ID: &str = "rg-0123456789";
pub const ACCOUNT_ID: &str = "abcdef0123456789abcdef0123456789";

pub const KMS_INSTANCE_CRN: &str =
    "crn:v1:bluemix:public:kms:us-south:a/abcdef0123456789abcdef0123456789:kms-instance-guid::";
pub const KMS_KEY_CRN: &str =
    "crn:v1:bluemix:public:kms:us-south:a/abcdef0123456789abcdef0123456789:kms-instance-guid:key:key-guid";
pub const HPCS_KEY_CRN: &str =
    "crn:v1:bluemix:public:hs-crypto:us-south:a/abcdef0123456789abcdef0123456789:hpcs-guid:key:key-guid";
pub const SECRETS_MANAGER_CRN: &str =
    "crn:v1:bluemix:public:secrets-manager:us-south:a/abcdef0123456789abcdef0123456789:sm-guid::";
pub const BACKUP_CRN: &str =
    "crn:v1:bluemix:public:databases-for-elasticsearch:us-south:a/abcdef0123456789abcdef0123456789:db-guid:backup:backup-guid";

pub const ADMIN_PASSWORD: &str = "Str0ngAdminPassw0rd";

/// Smallest configuration the gate accepts
pub fn minimal_config() -> DeploymentConfig {
    DeploymentConfig {
        resource_group_id: Some(RESOURCE_GROUP_ID.to_string()),
        ..DeploymentConfig::default()
    }
}

/// Platinum plan with model activation and an administrator credential
pub fn activation_config() -> DeploymentConfig {
    DeploymentConfig {
        plan: ServicePlan::Platinum,
        service_credential_names: CredentialBundle::new()
            .with("admin1", CredentialRole::Administrator)
            .with("user2", CredentialRole::Viewer),
        model_activation: search_cluster_infrastructure::config::ModelActivationConfig {
            enabled: true,
            ..Default::default()
        },
        ..minimal_config()
    }
}

/// Customer-managed encryption with an existing key and KMS instance
pub fn encrypted_config() -> DeploymentConfig {
    let mut config = minimal_config();
    config.encryption.kms_encryption_enabled = true;
    config.encryption.kms_key_crn = Some(KMS_KEY_CRN.to_string());
    config.encryption.existing_kms_instance_crn = Some(KMS_INSTANCE_CRN.to_string());
    config
}

/// `count` context rules, each allowing its own network zone
pub fn context_rules(count: usize) -> Vec<ContextRuleSpec> {
    (0..count)
        .map(|index| ContextRuleSpec {
            description: format!("allow zone {}", index),
            account_id: ACCOUNT_ID.to_string(),
            rule_contexts: vec![RuleContext {
                attributes: vec![RuleAttribute {
                    name: "networkZoneId".to_string(),
                    value: format!("zone-{}", index),
                }],
            }],
            enforcement_mode: EnforcementMode::Report,
        })
        .collect()
}

/// One secret group mirroring an administrator credential
pub fn secret_group(name: &str) -> SecretGroupSpec {
    SecretGroupSpec {
        secret_group_name: name.to_string(),
        secret_group_description: Some("search cluster credentials".to_string()),
        existing_secret_group: false,
        service_credentials: vec![SecretSpec {
            secret_name: format!("{}-admin", name),
            service_credentials_source_service_role: CredentialRole::Administrator,
            secret_labels: vec!["search".to_string()],
            secret_auto_rotation: true,
            secret_auto_rotation_interval: 89,
        }],
    }
}
