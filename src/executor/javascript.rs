//! Native backend: JavaScript
//!
//! There is no loader step; the harness is installed once when the backend
//! is built and each batch spawns its own evaluator. Inside a batch the
//! submission is isolated by function scope only, so globals it touches are
//! visible to every later call of the same batch.

use async_trait::async_trait;
use serde_json::Value;

use super::LanguageBackend;
use crate::core::ExecutionError;
use crate::languages::{Language, LanguageConfig};
use crate::runner::{CommandSpec, RunLimits};
use crate::runtime::{HarnessInstall, Namespace};

pub struct JavaScriptBackend {
    command: CommandSpec,
    limits: RunLimits,
    entry_point: String,
    _install: HarnessInstall,
}

impl JavaScriptBackend {
    pub fn new(config: &LanguageConfig) -> std::io::Result<Self> {
        let install = HarnessInstall::new(&config.harness_file, Language::Native.harness_source())?;
        let command = CommandSpec::from_vec(&config.run_command).with_work_dir(install.dir());

        Ok(Self {
            command,
            limits: RunLimits::new(config.memory_limit_mb),
            entry_point: config.entry_point.clone(),
            _install: install,
        })
    }
}

#[async_trait]
impl LanguageBackend for JavaScriptBackend {
    type Solution = Namespace;

    fn language(&self) -> Language {
        Language::Native
    }

    async fn prepare(&self, code: &str) -> Result<Namespace, ExecutionError> {
        let mut namespace = Namespace::open(&self.command, &self.limits, &self.entry_point).await?;
        namespace.define(code).await?;
        Ok(namespace)
    }

    async fn invoke(
        &self,
        namespace: &mut Namespace,
        args: &[Value],
    ) -> Result<Value, ExecutionError> {
        namespace.call::<Value>(args).await
    }
}
