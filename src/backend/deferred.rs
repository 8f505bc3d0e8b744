// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deferred key provisioning
//!
//! Used when planning without touching a key service. Keys that would be
//! provisioned resolve to a placeholder naming the service, ring and key,
//! so family classification still sees `kms` or `hs-crypto`.

use async_trait::async_trait;
use tracing::debug;

use super::{KeyProvisioner, KeyRequest};
use crate::errors::ProvisioningError;

#[derive(Debug, Clone, Copy, Default)]
pub struct DeferredKeyProvisioner;

impl DeferredKeyProvisioner {
    /// `<provisioned:{service}:{ring}/{key}>`
    pub fn placeholder(request: &KeyRequest) -> String {
        format!(
            "<provisioned:{}:{}/{}>",
            request.service_name, request.ring_name, request.key_name
        )
    }
}

#[async_trait]
impl KeyProvisioner for DeferredKeyProvisioner {
    async fn ensure_key(&self, request: &KeyRequest) -> Result<String, ProvisioningError> {
        let placeholder = Self::placeholder(request);
        debug!(key = %placeholder, "Key provisioning deferred");
        Ok(placeholder)
    }
}
