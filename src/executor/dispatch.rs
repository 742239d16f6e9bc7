//! Execution dispatcher

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use super::{Executor, JavaScriptBackend, PythonBackend};
use crate::core::{ExecutionError, ExecutionResult, TestCase};
use crate::languages::{Language, LanguageRegistry};
use crate::runtime::{InterpreterBootstrap, RuntimeLoader};

/// One executor per language; the Python runtime is shared by every batch
pub struct ExecutionService {
    loader: Arc<RuntimeLoader>,
    python: Executor<PythonBackend>,
    javascript: Executor<JavaScriptBackend>,
}

impl ExecutionService {
    /// Build the service from the language table.
    ///
    /// The Python runtime is not booted here; the first Python batch does it.
    pub fn new(
        registry: &LanguageRegistry,
        default_timeout: Duration,
        version_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let python_config = registry.get(Language::Dynamic)?.clone();
        let loader = Arc::new(RuntimeLoader::new(Arc::new(InterpreterBootstrap::new(
            python_config,
            version_timeout,
        ))));
        Self::with_loader(registry, loader, default_timeout)
    }

    /// Build the service around an existing Python loader
    pub fn with_loader(
        registry: &LanguageRegistry,
        loader: Arc<RuntimeLoader>,
        default_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let javascript_config = registry.get(Language::Native)?;
        let javascript = JavaScriptBackend::new(javascript_config)
            .context("Failed to install the JavaScript harness")?;

        Ok(Self {
            python: Executor::new(PythonBackend::new(Arc::clone(&loader)), default_timeout),
            javascript: Executor::new(javascript, default_timeout),
            loader,
        })
    }

    pub fn loader(&self) -> &Arc<RuntimeLoader> {
        &self.loader
    }

    /// Run `code` against `test_cases` with the executor for `language`
    pub async fn execute_code(
        &self,
        code: &str,
        test_cases: &[TestCase],
        language: Language,
        timeout: Option<Duration>,
    ) -> Result<ExecutionResult, ExecutionError> {
        match language {
            Language::Dynamic => self.python.execute(code, test_cases, timeout).await,
            Language::Native => self.javascript.execute(code, test_cases, timeout).await,
        }
    }
}
