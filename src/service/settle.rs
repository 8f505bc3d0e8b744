// Copyright (c) 2025 - Cowboy AI, Inc.
//! Settling Strategies
//!
//! A settle step waits for an authorization policy to take effect before
//! dependent resources are declared. [`FixedDelay`] waits the step's
//! duration unconditionally; it does not observe propagation. A polling
//! strategy can implement [`SettleStrategy`] without changing the graph.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::errors::ProvisioningError;
use crate::graph::SettleStep;

#[async_trait]
pub trait SettleStrategy: Send + Sync {
    async fn settle(&self, step: &SettleStep) -> Result<(), ProvisioningError>;
}

/// Sleep for the step's duration
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedDelay;

#[async_trait]
impl SettleStrategy for FixedDelay {
    async fn settle(&self, step: &SettleStep) -> Result<(), ProvisioningError> {
        info!(
            policy = %step.policy,
            seconds = step.duration.as_secs(),
            "Waiting for authorization policy to settle"
        );
        tokio::time::sleep(step.duration).await;
        debug!(policy = %step.policy, "Settling delay elapsed");
        Ok(())
    }
}
