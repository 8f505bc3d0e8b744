// Copyright (c) 2025 - Cowboy AI, Inc.
//! Script-based model activation
//!
//! Runs the install and start scripts as child processes. The connection
//! string reaches them only through the environment.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tracing::debug;

use crate::service::activation::{ActivationEnv, ActivationError, ActivationStage, ModelActivator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptActivator {
    install_script: PathBuf,
    start_script: PathBuf,
}

impl ScriptActivator {
    pub fn new(install_script: impl Into<PathBuf>, start_script: impl Into<PathBuf>) -> Self {
        Self {
            install_script: install_script.into(),
            start_script: start_script.into(),
        }
    }

    /// `install_model.sh` and `start_model.sh` inside `directory`
    pub fn from_directory(directory: impl AsRef<Path>) -> Self {
        let directory = directory.as_ref();
        Self::new(
            directory.join("install_model.sh"),
            directory.join("start_model.sh"),
        )
    }

    async fn run(
        &self,
        stage: ActivationStage,
        script: &Path,
        env: &ActivationEnv,
    ) -> Result<(), ActivationError> {
        debug!(stage = %stage, script = %script.display(), "Running activation script");

        let mut cmd = tokio::process::Command::new(script);
        cmd.envs(env.vars())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = cmd.output().await.map_err(|e| ActivationError::StepFailed {
            stage,
            message: format!("failed to spawn {}: {}", script.display(), e),
        })?;

        if !output.status.success() {
            return Err(ActivationError::StepFailed {
                stage,
                message: format!(
                    "{} ({})",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl ModelActivator for ScriptActivator {
    async fn install_model(&self, env: &ActivationEnv) -> Result<(), ActivationError> {
        self.run(ActivationStage::Install, &self.install_script, env).await
    }

    async fn start_model(&self, env: &ActivationEnv) -> Result<(), ActivationError> {
        self.run(ActivationStage::Start, &self.start_script, env).await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::service::activation::activate_model;

    fn env() -> ActivationEnv {
        ActivationEnv {
            connection_string: "https://admin:pw@host:31000".to_string(),
            model_type: ".elser_model_2_linux-x86_64".to_string(),
        }
    }

    #[tokio::test]
    async fn test_successful_scripts_complete() {
        let activator = ScriptActivator::new("/bin/sh", "/bin/sh");
        // `sh` reads an empty stdin and exits 0
        activate_model(&activator, &env()).await.unwrap();
    }

    #[tokio::test]
    async fn test_non_zero_exit_fails_stage() {
        let activator = ScriptActivator::new("/bin/false", "/bin/true");
        let err = activator.install_model(&env()).await.unwrap_err();
        assert!(matches!(
            err,
            ActivationError::StepFailed {
                stage: ActivationStage::Install,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_script_fails_to_spawn() {
        let activator = ScriptActivator::from_directory("/nonexistent-activation-dir");
        let err = activator.start_model(&env()).await.unwrap_err();
        assert!(err.to_string().contains("failed to spawn"));
    }
}
