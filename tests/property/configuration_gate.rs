// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for the Configuration Gate
//!
//! Key presence rules, plan gating and admin password shape.

use proptest::prelude::*;
use search_cluster_infrastructure::config::ServicePlan;
use search_cluster_infrastructure::domain::invariants::{
    validate_admin_password, validate_configuration, validate_encryption_key_present,
    validate_keys_without_encryption, validate_model_activation_plan,
};
use search_cluster_infrastructure::domain::ConfigurationError;
use search_cluster_infrastructure::DeploymentConfig;

const KEY: &str = "crn:v1:bluemix:public:kms:us-south:a/acct:kms-guid:key:key-guid";
const KMS_INSTANCE: &str = "crn:v1:bluemix:public:kms:us-south:a/acct:kms-guid::";

fn plan() -> impl Strategy<Value = ServicePlan> {
    prop_oneof![
        Just(ServicePlan::Standard),
        Just(ServicePlan::Enterprise),
        Just(ServicePlan::Platinum),
    ]
}

fn optional_key() -> impl Strategy<Value = Option<&'static str>> {
    prop::option::of(Just(KEY))
}

fn base_config() -> DeploymentConfig {
    DeploymentConfig {
        resource_group_id: Some("rg-0123456789".to_string()),
        ..DeploymentConfig::default()
    }
}

proptest! {
    /// Property: with encryption disabled, any key identifier fails the gate
    #[test]
    fn prop_disabled_encryption_rejects_any_key(primary in optional_key(), backup in optional_key()) {
        let result = validate_keys_without_encryption(false, primary, backup);
        prop_assert_eq!(result.is_err(), primary.is_some() || backup.is_some());
    }

    /// Property: with encryption enabled, at least one key is required
    #[test]
    fn prop_enabled_encryption_needs_a_key(primary in optional_key(), backup in optional_key()) {
        let result = validate_encryption_key_present(true, primary, backup);
        prop_assert_eq!(
            result == Err(ConfigurationError::EncryptionKeyMissing),
            primary.is_none() && backup.is_none()
        );
    }

    /// Property: the two key rules never fire for the other encryption setting
    #[test]
    fn prop_key_rules_are_conditional(primary in optional_key(), backup in optional_key()) {
        prop_assert!(validate_keys_without_encryption(true, primary, backup).is_ok());
        prop_assert!(validate_encryption_key_present(false, primary, backup).is_ok());
    }

    /// Property: model activation passes only on the premium plan
    #[test]
    fn prop_activation_requires_premium(plan in plan(), enabled in any::<bool>()) {
        let result = validate_model_activation_plan(enabled, plan);
        prop_assert_eq!(result.is_ok(), !enabled || plan == ServicePlan::Platinum);
    }

    /// Property: well-formed passwords of legal length pass
    #[test]
    fn prop_well_formed_password_passes(password in "[A-Za-z0-9][A-Za-z0-9_-]{14,31}") {
        prop_assert!(validate_admin_password(Some(&password)).is_ok());
    }

    /// Property: passwords shorter than 15 characters fail
    #[test]
    fn prop_short_password_fails(password in "[A-Za-z0-9]{1,14}") {
        prop_assert!(validate_admin_password(Some(&password)).is_err());
    }

    /// Property: a leading separator always fails
    #[test]
    fn prop_leading_separator_fails(lead in "[_-]", rest in "[A-Za-z0-9]{14,31}") {
        let password = format!("{}{}", lead, rest);
        prop_assert!(validate_admin_password(Some(&password)).is_err());
    }

    /// Property: the whole gate agrees with the key rules on encryption inputs
    #[test]
    fn prop_gate_reports_key_errors(
        enabled in any::<bool>(),
        primary in optional_key(),
        backup in optional_key(),
    ) {
        let mut config = base_config();
        config.encryption.kms_encryption_enabled = enabled;
        config.encryption.kms_key_crn = primary.map(str::to_string);
        config.encryption.backup_encryption_key_crn = backup.map(str::to_string);
        config.encryption.existing_kms_instance_crn = Some(KMS_INSTANCE.to_string());

        let any_key = primary.is_some() || backup.is_some();
        let expected_ok = if enabled { any_key } else { !any_key };

        match validate_configuration(&config) {
            Ok(()) => prop_assert!(expected_ok),
            Err(errors) => {
                prop_assert!(!expected_ok, "unexpected errors: {}", errors);
                let key_error = errors.errors().iter().any(|error| {
                    matches!(
                        error,
                        ConfigurationError::KeySetWithoutEncryption { .. }
                            | ConfigurationError::EncryptionKeyMissing
                    )
                });
                prop_assert!(key_error);
            }
        }
    }
}
