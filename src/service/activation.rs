// Copyright (c) 2025 - Cowboy AI, Inc.
//! Model Activation
//!
//! Two opaque external steps run against the finished cluster: install the
//! embedding model, then start it. `start_model` runs only after
//! `install_model` succeeded.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;
use tracing::info;

/// Environment variable carrying the activation connection string
pub const CONNECTION_ENV_VAR: &str = "ES";

/// Environment variable carrying the model identifier
pub const MODEL_TYPE_ENV_VAR: &str = "ELSER_MODEL_TYPE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationStage {
    Install,
    Start,
}

impl fmt::Display for ActivationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Install => f.write_str("install_model"),
            Self::Start => f.write_str("start_model"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivationError {
    #[error("no administrator credentials with a non-empty username and password")]
    MissingAdminCredentials,

    #[error("cluster exposes no endpoint to activate against")]
    MissingEndpoint,

    #[error("{stage} failed: {message}")]
    StepFailed {
        stage: ActivationStage,
        message: String,
    },
}

/// Environment handed to both activation steps
#[derive(Clone, PartialEq, Eq)]
pub struct ActivationEnv {
    pub connection_string: String,
    pub model_type: String,
}

impl ActivationEnv {
    pub fn vars(&self) -> [(&'static str, &str); 2] {
        [
            (CONNECTION_ENV_VAR, self.connection_string.as_str()),
            (MODEL_TYPE_ENV_VAR, self.model_type.as_str()),
        ]
    }
}

impl fmt::Debug for ActivationEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivationEnv")
            .field("connection_string", &"<redacted>")
            .field("model_type", &self.model_type)
            .finish()
    }
}

#[async_trait]
pub trait ModelActivator: Send + Sync {
    async fn install_model(&self, env: &ActivationEnv) -> Result<(), ActivationError>;

    async fn start_model(&self, env: &ActivationEnv) -> Result<(), ActivationError>;
}

/// Install, then start
pub async fn activate_model(
    activator: &dyn ModelActivator,
    env: &ActivationEnv,
) -> Result<(), ActivationError> {
    info!(model_type = %env.model_type, "Installing model");
    activator.install_model(env).await?;

    info!(model_type = %env.model_type, "Starting model");
    activator.start_model(env).await
}
