// Copyright (c) 2025 - Cowboy AI, Inc.
//! Validation Gate - Configuration Invariants
//!
//! Pure checks run before anything is resolved or declared. Every rule is
//! evaluated; failures are collected rather than short-circuited so the
//! caller sees all of them at once.
//!
//! # Rule Categories
//!
//! 1. **Encryption**: key identifiers agree with the encryption toggle
//! 2. **Model activation**: premium plan and a source of admin credentials
//! 3. **Input shape**: CRNs parse, admin password format, resource group
//! 4. **Secret mirroring**: a secret store instance is named

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::config::{DeploymentConfig, ServicePlan};
use crate::domain::crn::Crn;

/// Validation result for a single rule
pub type ValidationResult = Result<(), ConfigurationError>;

/// A failed configuration rule, naming the implicated inputs
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("kms_encryption_enabled is false, so {} must not be set", .inputs.join(" and "))]
    KeySetWithoutEncryption { inputs: Vec<&'static str> },

    #[error("kms_encryption_enabled is true, so at least one of kms_key_crn or backup_encryption_key_crn must be set")]
    EncryptionKeyMissing,

    #[error("kms_encryption_enabled is true and skip_iam_authorization_policy is false, so existing_kms_instance_crn must be set")]
    KmsInstanceRequired,

    #[error("backup_encryption_key_crn and use_default_backup_encryption_key are mutually exclusive")]
    BackupKeyConflict,

    #[error("model_activation.enabled requires plan `{}`, got `{plan}`", ServicePlan::PREMIUM)]
    ModelActivationPlan { plan: ServicePlan },

    #[error("model_activation.enabled requires an Administrator entry in service_credential_names or admin_pass")]
    ModelActivationAdminMissing,

    #[error("one of resource_group_id or resource_group_name must be set")]
    ResourceGroupMissing,

    #[error("admin_pass {reason}")]
    InvalidAdminPassword { reason: &'static str },

    #[error("{input} is not a valid CRN: {reason}")]
    MalformedCrn { input: &'static str, reason: String },

    #[error("backup_crn must reference a backup, found resource type `{found}`")]
    NotABackup { found: String },

    #[error("service_credential_secrets requires existing_secrets_manager_instance_crn")]
    SecretsManagerInstanceRequired,
}

/// Every failed rule of one configuration; never empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationErrors(Vec<ConfigurationError>);

impl ConfigurationErrors {
    pub fn errors(&self) -> &[ConfigurationError] {
        &self.0
    }

    pub fn contains(&self, error: &ConfigurationError) -> bool {
        self.0.contains(error)
    }
}

impl fmt::Display for ConfigurationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigurationErrors {}

/// Run every rule against the configuration
pub fn validate_configuration(config: &DeploymentConfig) -> Result<(), ConfigurationErrors> {
    let encryption = &config.encryption;
    let bundle = &config.service_credential_names;

    let results = [
        validate_keys_without_encryption(
            encryption.kms_encryption_enabled,
            encryption.kms_key_crn.as_deref(),
            encryption.backup_encryption_key_crn.as_deref(),
        ),
        validate_encryption_key_present(
            encryption.kms_encryption_enabled,
            encryption.kms_key_crn.as_deref(),
            encryption.backup_encryption_key_crn.as_deref(),
        ),
        validate_kms_instance_present(
            encryption.kms_encryption_enabled,
            encryption.skip_iam_authorization_policy,
            encryption.existing_kms_instance_crn.as_deref(),
        ),
        validate_backup_key_exclusive(
            encryption.backup_encryption_key_crn.as_deref(),
            encryption.use_default_backup_encryption_key,
        ),
        validate_model_activation_plan(config.model_activation.enabled, config.plan),
        validate_model_activation_admin(
            config.model_activation.enabled,
            bundle.first_administrator().is_some(),
            config.admin_pass.is_some(),
        ),
        validate_resource_group(
            config.resource_group_id.as_deref(),
            config.resource_group_name.as_deref(),
        ),
        validate_admin_password(config.admin_pass.as_deref()),
        validate_crn("kms_key_crn", encryption.kms_key_crn.as_deref()),
        validate_crn(
            "backup_encryption_key_crn",
            encryption.backup_encryption_key_crn.as_deref(),
        ),
        validate_crn(
            "existing_kms_instance_crn",
            encryption.existing_kms_instance_crn.as_deref(),
        ),
        validate_crn(
            "existing_secrets_manager_instance_crn",
            config.secrets.existing_secrets_manager_instance_crn.as_deref(),
        ),
        validate_backup_crn(config.backup_crn.as_deref()),
        validate_secrets_manager_instance(
            !config.secrets.service_credential_secrets.is_empty(),
            config.secrets.existing_secrets_manager_instance_crn.as_deref(),
        ),
    ];

    let errors: Vec<ConfigurationError> = results.into_iter().filter_map(Result::err).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigurationErrors(errors))
    }
}

/// Encryption disabled → no key identifier may be set
pub fn validate_keys_without_encryption(
    encryption_enabled: bool,
    primary_key: Option<&str>,
    backup_key: Option<&str>,
) -> ValidationResult {
    if encryption_enabled {
        return Ok(());
    }

    let mut inputs = Vec::new();
    if primary_key.is_some() {
        inputs.push("kms_key_crn");
    }
    if backup_key.is_some() {
        inputs.push("backup_encryption_key_crn");
    }

    if inputs.is_empty() {
        Ok(())
    } else {
        Err(ConfigurationError::KeySetWithoutEncryption { inputs })
    }
}

/// Encryption enabled → at least one key identifier
pub fn validate_encryption_key_present(
    encryption_enabled: bool,
    primary_key: Option<&str>,
    backup_key: Option<&str>,
) -> ValidationResult {
    if encryption_enabled && primary_key.is_none() && backup_key.is_none() {
        return Err(ConfigurationError::EncryptionKeyMissing);
    }
    Ok(())
}

/// Encryption enabled with automatic authorization → KMS instance named
pub fn validate_kms_instance_present(
    encryption_enabled: bool,
    skip_authorization_policy: bool,
    kms_instance: Option<&str>,
) -> ValidationResult {
    if encryption_enabled && !skip_authorization_policy && kms_instance.is_none() {
        return Err(ConfigurationError::KmsInstanceRequired);
    }
    Ok(())
}

/// Explicit backup key and default backup key are exclusive
pub fn validate_backup_key_exclusive(
    backup_key: Option<&str>,
    use_default_backup_key: bool,
) -> ValidationResult {
    if backup_key.is_some() && use_default_backup_key {
        return Err(ConfigurationError::BackupKeyConflict);
    }
    Ok(())
}

/// Model activation → premium plan
pub fn validate_model_activation_plan(activation_enabled: bool, plan: ServicePlan) -> ValidationResult {
    if activation_enabled && plan != ServicePlan::PREMIUM {
        return Err(ConfigurationError::ModelActivationPlan { plan });
    }
    Ok(())
}

/// Model activation → administrator credential or admin password
pub fn validate_model_activation_admin(
    activation_enabled: bool,
    has_administrator_credential: bool,
    has_admin_password: bool,
) -> ValidationResult {
    if activation_enabled && !has_administrator_credential && !has_admin_password {
        return Err(ConfigurationError::ModelActivationAdminMissing);
    }
    Ok(())
}

pub fn validate_resource_group(
    resource_group_id: Option<&str>,
    resource_group_name: Option<&str>,
) -> ValidationResult {
    if resource_group_id.is_none() && resource_group_name.is_none() {
        return Err(ConfigurationError::ResourceGroupMissing);
    }
    Ok(())
}

static ADMIN_PASSWORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("admin password pattern is a valid regex")
});

/// Admin password: 15 to 32 characters, alphanumeric first, then `[A-Za-z0-9_-]`
pub fn validate_admin_password(admin_password: Option<&str>) -> ValidationResult {
    let Some(password) = admin_password else {
        return Ok(());
    };

    if !(15..=32).contains(&password.chars().count()) {
        return Err(ConfigurationError::InvalidAdminPassword {
            reason: "must be between 15 and 32 characters",
        });
    }

    if !ADMIN_PASSWORD_PATTERN.is_match(password) {
        return Err(ConfigurationError::InvalidAdminPassword {
            reason: "must start with a letter or digit and contain only letters, digits, `_` or `-`",
        });
    }

    Ok(())
}

/// Optional CRN input parses
pub fn validate_crn(input: &'static str, value: Option<&str>) -> ValidationResult {
    match value.map(Crn::parse) {
        Some(Err(err)) => Err(ConfigurationError::MalformedCrn {
            input,
            reason: err.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Restore source is a backup CRN
pub fn validate_backup_crn(backup_crn: Option<&str>) -> ValidationResult {
    let Some(value) = backup_crn else {
        return Ok(());
    };

    let crn = Crn::parse(value).map_err(|err| ConfigurationError::MalformedCrn {
        input: "backup_crn",
        reason: err.to_string(),
    })?;

    match crn.resource_type() {
        Some("backup") => Ok(()),
        other => Err(ConfigurationError::NotABackup {
            found: other.unwrap_or_default().to_string(),
        }),
    }
}

pub fn validate_secrets_manager_instance(
    has_secret_groups: bool,
    secrets_manager_instance: Option<&str>,
) -> ValidationResult {
    if has_secret_groups && secrets_manager_instance.is_none() {
        return Err(ConfigurationError::SecretsManagerInstanceRequired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::credentials::{CredentialBundle, CredentialRole};
    use test_case::test_case;

    const KEY: &str = "crn:v1:bluemix:public:kms:us-south:a/acct:inst:key:k1";
    const INSTANCE: &str = "crn:v1:bluemix:public:kms:us-south:a/acct:inst::";

    fn base_config() -> DeploymentConfig {
        DeploymentConfig {
            resource_group_id: Some("rg-1".to_string()),
            ..DeploymentConfig::default()
        }
    }

    #[test]
    fn test_default_with_resource_group_is_valid() {
        assert!(validate_configuration(&base_config()).is_ok());
    }

    #[test_case(Some(KEY), None ; "primary")]
    #[test_case(None, Some(KEY) ; "backup")]
    #[test_case(Some(KEY), Some(KEY) ; "both")]
    fn test_keys_rejected_without_encryption(primary: Option<&str>, backup: Option<&str>) {
        let err = validate_keys_without_encryption(false, primary, backup).unwrap_err();
        assert!(err.to_string().contains("kms_encryption_enabled is false"));
    }

    #[test]
    fn test_encryption_requires_a_key() {
        assert_eq!(
            validate_encryption_key_present(true, None, None),
            Err(ConfigurationError::EncryptionKeyMissing)
        );
        assert!(validate_encryption_key_present(true, None, Some(KEY)).is_ok());
        assert!(validate_encryption_key_present(false, None, None).is_ok());
    }

    #[test]
    fn test_kms_instance_rule() {
        assert_eq!(
            validate_kms_instance_present(true, false, None),
            Err(ConfigurationError::KmsInstanceRequired)
        );
        assert!(validate_kms_instance_present(true, true, None).is_ok());
        assert!(validate_kms_instance_present(true, false, Some(INSTANCE)).is_ok());
    }

    #[test]
    fn test_backup_key_conflict() {
        assert_eq!(
            validate_backup_key_exclusive(Some(KEY), true),
            Err(ConfigurationError::BackupKeyConflict)
        );
        assert!(validate_backup_key_exclusive(None, true).is_ok());
    }

    #[test_case(ServicePlan::Standard => false ; "standard")]
    #[test_case(ServicePlan::Enterprise => false ; "enterprise")]
    #[test_case(ServicePlan::Platinum => true ; "platinum")]
    fn test_model_activation_plan(plan: ServicePlan) -> bool {
        validate_model_activation_plan(true, plan).is_ok()
    }

    #[test]
    fn test_model_activation_admin() {
        assert!(validate_model_activation_admin(true, true, false).is_ok());
        assert!(validate_model_activation_admin(true, false, true).is_ok());
        assert!(validate_model_activation_admin(false, false, false).is_ok());
        assert_eq!(
            validate_model_activation_admin(true, false, false),
            Err(ConfigurationError::ModelActivationAdminMissing)
        );
    }

    #[test_case("short" => false ; "too short")]
    #[test_case("abcdefghijklmno" => true ; "fifteen characters")]
    #[test_case("_abcdefghijklmnop" => false ; "special first")]
    #[test_case("abcdefgh ijklmnop" => false ; "space")]
    #[test_case("Abc-def_ghi-jkl-123" => true ; "hyphen and underscore")]
    #[test_case("a23456789012345678901234567890123" => false ; "thirty three characters")]
    fn test_admin_password(password: &str) -> bool {
        validate_admin_password(Some(password)).is_ok()
    }

    #[test]
    fn test_admin_password_reports_character_rule() {
        for password in ["-abcdefghijklmnop", "abcdefghijklmnop!", "abcdefghijklmnop\n"] {
            assert_eq!(
                validate_admin_password(Some(password)),
                Err(ConfigurationError::InvalidAdminPassword {
                    reason: "must start with a letter or digit and contain only letters, digits, `_` or `-`",
                })
            );
        }
        assert_eq!(validate_admin_password(None), Ok(()));
    }

    #[test]
    fn test_backup_crn() {
        assert!(validate_backup_crn(Some(
            "crn:v1:bluemix:public:databases-for-elasticsearch:us-south:a/acct:inst:backup:b1"
        ))
        .is_ok());
        assert_eq!(
            validate_backup_crn(Some(KEY)),
            Err(ConfigurationError::NotABackup {
                found: "key".to_string()
            })
        );
        assert!(matches!(
            validate_backup_crn(Some("nope")),
            Err(ConfigurationError::MalformedCrn { input: "backup_crn", .. })
        ));
    }

    #[test]
    fn test_all_failures_are_reported() {
        let mut config = DeploymentConfig::default();
        config.encryption.kms_key_crn = Some(KEY.to_string());
        config.model_activation.enabled = true;
        config.plan = ServicePlan::Standard;

        let errors = validate_configuration(&config).unwrap_err();
        assert!(errors.contains(&ConfigurationError::KeySetWithoutEncryption {
            inputs: vec!["kms_key_crn"]
        }));
        assert!(errors.contains(&ConfigurationError::ModelActivationPlan {
            plan: ServicePlan::Standard
        }));
        assert!(errors.contains(&ConfigurationError::ModelActivationAdminMissing));
        assert!(errors.contains(&ConfigurationError::ResourceGroupMissing));
        assert_eq!(errors.errors().len(), 4);
    }

    #[test]
    fn test_model_activation_with_administrator_credential() {
        let mut config = base_config();
        config.plan = ServicePlan::Platinum;
        config.model_activation.enabled = true;
        config.service_credential_names =
            CredentialBundle::new().with("admin1", CredentialRole::Administrator);
        assert!(validate_configuration(&config).is_ok());
    }
}
