//! Interpreter bootstrap
//!
//! Finds the configured interpreter, checks its version and installs the
//! harness script it will run. A missing or unusable interpreter is reported
//! as `ExecutionError::RuntimeUnavailable`.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tracing::{debug, info};

use crate::core::ExecutionError;
use crate::languages::{parse_version, LanguageConfig};
use crate::runner::{run_trusted, CommandSpec, RunLimits};
use crate::runtime::handle::RuntimeHandle;

/// Produces a runtime handle; called by the loader at most once per attempt
#[async_trait]
pub trait RuntimeBootstrap: Send + Sync {
    async fn boot(&self) -> Result<RuntimeHandle, ExecutionError>;
}

/// A harness script written to a private directory
#[derive(Debug)]
pub struct HarnessInstall {
    dir: TempDir,
}

impl HarnessInstall {
    pub fn new(file_name: &str, source: &str) -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("challenge-harness-").tempdir()?;
        fs::write(dir.path().join(file_name), source)?;
        Ok(Self { dir })
    }

    /// Directory holding the harness; harness commands run from here
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Boots an interpreter described by a language configuration
pub struct InterpreterBootstrap {
    config: LanguageConfig,
    version_timeout: Duration,
}

impl InterpreterBootstrap {
    pub fn new(config: LanguageConfig, version_timeout: Duration) -> Self {
        Self {
            config,
            version_timeout,
        }
    }

    fn version_command(&self) -> CommandSpec {
        match &self.config.version_command {
            Some(cmd) => CommandSpec::from_vec(cmd),
            None => {
                let program = self.config.run_command.first().cloned().unwrap_or_default();
                CommandSpec::new(program).with_args(["--version"])
            }
        }
    }

    /// Run the version command and check the reported version
    async fn check_version(&self) -> Result<String, ExecutionError> {
        let cmd = self.version_command();
        let outcome = run_trusted(&cmd, self.version_timeout)
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => {
                    ExecutionError::RuntimeUnavailable(format!("{} is not installed", cmd.program))
                }
                _ => ExecutionError::RuntimeUnavailable(format!(
                    "failed to start {}: {}",
                    cmd.program, e
                )),
            })?;

        if !outcome.is_success() {
            return Err(ExecutionError::RuntimeUnavailable(format!(
                "{} exited with code {}: {}",
                cmd.program,
                outcome.exit_code,
                outcome.stderr.trim()
            )));
        }

        // Some interpreters print their version on stderr
        let reported = format!("{} {}", outcome.stdout, outcome.stderr);
        let version = extract_version(&reported).ok_or_else(|| {
            ExecutionError::RuntimeUnavailable(format!(
                "could not read a version from {}: {}",
                cmd.program,
                reported.trim()
            ))
        })?;

        if let Some((min_major, min_minor)) = self.config.min_version {
            let (major, minor) = parse_version(&version)
                .map_err(|e| ExecutionError::RuntimeUnavailable(e.to_string()))?;
            if (major, minor) < (min_major, min_minor) {
                return Err(ExecutionError::RuntimeUnavailable(format!(
                    "{} {} is older than the required {}.{}",
                    cmd.program, version, min_major, min_minor
                )));
            }
        }

        debug!(
            program = %cmd.program,
            version = %version,
            check_ms = outcome.time_ms,
            "Interpreter version check succeeded"
        );
        Ok(version)
    }
}

#[async_trait]
impl RuntimeBootstrap for InterpreterBootstrap {
    async fn boot(&self) -> Result<RuntimeHandle, ExecutionError> {
        let version = self.check_version().await?;

        let install = HarnessInstall::new(
            &self.config.harness_file,
            self.config.language.harness_source(),
        )
        .map_err(|e| {
            ExecutionError::RuntimeUnavailable(format!("failed to install harness: {}", e))
        })?;

        info!(
            language = %self.config.language,
            version = %version,
            harness = %install.dir().display(),
            "Interpreter bootstrapped"
        );

        Ok(RuntimeHandle::installed(
            install,
            &self.config.run_command,
            RunLimits::new(self.config.memory_limit_mb),
            self.config.entry_point.clone(),
            version,
        ))
    }
}

/// First whitespace-separated token that looks like a version number
fn extract_version(text: &str) -> Option<String> {
    text.split_whitespace()
        .map(|token| token.trim_start_matches('v'))
        .find(|token| {
            token.chars().next().is_some_and(|c| c.is_ascii_digit()) && token.contains('.')
        })
        .map(|token| token.to_string())
}
