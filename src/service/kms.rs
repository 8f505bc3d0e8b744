// Copyright (c) 2025 - Cowboy AI, Inc.
//! KMS Resolver
//!
//! Resolves the encryption plan once per run:
//!
//! 1. parse the existing KMS instance CRN (guid and region)
//! 2. primary key = `kms_key_crn`, or a key provisioned in that instance
//! 3. classify the key family
//! 4. resolve the backup key
//! 5. decide whether the key-read policy needs the cross-account credential
//!
//! The key-provisioning call is the only side effect and is idempotent per
//! ring and key name.

use tracing::{debug, info};

use crate::backend::{KeyProvisioner, KeyRequest};
use crate::config::DeploymentConfig;
use crate::domain::encryption::{
    classify_key_family, requires_cross_account_policy, resolve_backup_key, EncryptionPlan,
    KeyServiceFamily, KmsInstance,
};
use crate::errors::DeploymentResult;

pub async fn resolve_encryption(
    config: &DeploymentConfig,
    keys: &dyn KeyProvisioner,
) -> DeploymentResult<EncryptionPlan> {
    let encryption = &config.encryption;

    let kms_instance = encryption
        .existing_kms_instance_crn
        .as_deref()
        .map(KmsInstance::from_crn)
        .transpose()?;

    if !encryption.kms_encryption_enabled {
        debug!("Customer-managed encryption disabled");
        return Ok(EncryptionPlan {
            kms_instance,
            ..EncryptionPlan::disabled()
        });
    }

    let primary_key_crn = match (&encryption.kms_key_crn, &kms_instance) {
        (Some(existing), _) => Some(existing.clone()),
        (None, Some(instance)) => {
            let request = KeyRequest {
                service_name: instance.service_name(KeyServiceFamily::None),
                instance_guid: instance.guid.clone(),
                region: instance.region.clone(),
                ring_name: config.prefixed(&encryption.key_ring_name),
                key_name: config.prefixed(&encryption.key_name),
                rotation_interval_months: encryption.key_rotation_interval_months,
                standard_key: encryption.standard_key,
            };
            info!(
                instance = %instance.guid,
                region = %instance.region,
                ring = %request.ring_name,
                key = %request.key_name,
                "Provisioning encryption key"
            );
            Some(keys.ensure_key(&request).await?)
        }
        (None, None) => None,
    };

    let key_service_family = classify_key_family(primary_key_crn.as_deref());
    let backup_key_crn = resolve_backup_key(
        encryption.use_default_backup_encryption_key,
        encryption.backup_encryption_key_crn.as_deref(),
        primary_key_crn.as_deref(),
    );
    let cross_account = requires_cross_account_policy(
        encryption.skip_iam_authorization_policy,
        encryption.ibmcloud_kms_api_key.as_deref(),
    );

    info!(
        family = %key_service_family,
        backup_key = backup_key_crn.is_some(),
        cross_account,
        "Encryption resolved"
    );

    Ok(EncryptionPlan {
        primary_key_crn,
        backup_key_crn,
        key_service_family,
        requires_cross_account_policy: cross_account,
        kms_instance,
    })
}
