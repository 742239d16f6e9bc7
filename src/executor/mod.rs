//! Executor module - runs a submission against its test cases
//!
//! - `Executor`: the language-independent batch loop (timeout race,
//!   per-case error containment, aggregation)
//! - `python` / `javascript`: the two `LanguageBackend`s
//! - `dispatch`: picks the executor for a language
//!
//! The executor module does NOT:
//! - Decide how values compare (see `core::compare`)
//! - Talk to the queue

pub mod dispatch;
pub mod javascript;
pub mod python;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::core::model::validate_batch;
use crate::core::{ExecutionError, ExecutionResult, TestCase, TestCaseResult};
use crate::languages::Language;

pub use dispatch::ExecutionService;
pub use javascript::JavaScriptBackend;
pub use python::PythonBackend;

/// Timeout applied when the caller does not pass one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// A language runtime able to define a submission and call it per test case
#[async_trait]
pub trait LanguageBackend: Send + Sync {
    /// A defined submission together with the namespace it lives in
    type Solution: Send;

    fn language(&self) -> Language;

    /// Make the runtime ready before the submission is defined
    async fn warm_up(&self) -> Result<(), ExecutionError> {
        Ok(())
    }

    /// Evaluate the submission in a fresh namespace.
    ///
    /// Fails with `Definition` when the code does not define the entry point.
    async fn prepare(&self, code: &str) -> Result<Self::Solution, ExecutionError>;

    /// Call the defined entry point with one test case's arguments.
    ///
    /// `Invocation` is an error raised by the submission for this input.
    /// Any other error means the namespace is gone and the solution must be
    /// prepared again.
    async fn invoke(
        &self,
        solution: &mut Self::Solution,
        args: &[Value],
    ) -> Result<Value, ExecutionError>;
}

pub struct Executor<B> {
    backend: B,
    default_timeout: Duration,
}

impl<B: LanguageBackend> Executor<B> {
    pub fn new(backend: B, default_timeout: Duration) -> Self {
        Self {
            backend,
            default_timeout,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run every test case against `code`, bounded by `timeout`.
    ///
    /// Timeouts, definition failures and an unavailable runtime resolve to a
    /// failed `ExecutionResult`; only caller or host failures are `Err`.
    #[tracing::instrument(
        skip(self, code, test_cases),
        fields(language = %self.backend.language(), cases = test_cases.len())
    )]
    pub async fn execute(
        &self,
        code: &str,
        test_cases: &[TestCase],
        timeout: Option<Duration>,
    ) -> Result<ExecutionResult, ExecutionError> {
        validate_batch(test_cases)?;

        let limit = timeout.unwrap_or(self.default_timeout);
        let start = Instant::now();

        let outcome = tokio::time::timeout(limit, self.run_batch(code, test_cases)).await;

        match outcome {
            Ok(Ok((results, elapsed))) => {
                let result = ExecutionResult::from_cases(results, elapsed);
                info!(
                    verdict = %result.verdict,
                    passed = result.passed_tests,
                    total = result.total_tests,
                    time_ms = result.execution_time,
                    "Batch finished"
                );
                Ok(result)
            }
            Ok(Err(e)) if e.is_batch_level() => {
                info!("Batch failed: {}", e);
                Ok(ExecutionResult::batch_failure(
                    &e,
                    test_cases.len(),
                    start.elapsed(),
                ))
            }
            Ok(Err(e)) => {
                warn!("Batch aborted by host failure: {}", e);
                Err(e)
            }
            Err(_) => {
                // The batch future was dropped, taking the namespace with it
                let error = ExecutionError::Timeout(limit.as_millis() as u64);
                info!(timeout_ms = limit.as_millis() as u64, "Batch timed out");
                Ok(ExecutionResult::batch_failure(
                    &error,
                    test_cases.len(),
                    start.elapsed(),
                ))
            }
        }
    }

    /// Define the submission and invoke it once per case, in order.
    ///
    /// Returns the case results and the time spent from definition onwards.
    async fn run_batch(
        &self,
        code: &str,
        test_cases: &[TestCase],
    ) -> Result<(Vec<TestCaseResult>, Duration), ExecutionError> {
        self.backend.warm_up().await?;

        let started = Instant::now();
        let mut solution = Ok(self.backend.prepare(code).await?);
        let mut namespace_lost = false;
        let mut results = Vec::with_capacity(test_cases.len());

        for tc in test_cases {
            if namespace_lost {
                namespace_lost = false;
                solution = self
                    .backend
                    .prepare(code)
                    .await
                    .map_err(|e| e.to_string());
            }

            let result = match &mut solution {
                Ok(defined) => match self.backend.invoke(defined, &tc.input).await {
                    Ok(actual) => TestCaseResult::returned(tc, actual),
                    Err(ExecutionError::Invocation(message)) => TestCaseResult::raised(tc, message),
                    Err(e) => {
                        warn!(case = tc.id, "Namespace lost: {}", e);
                        namespace_lost = true;
                        TestCaseResult::raised(tc, e.to_string())
                    }
                },
                Err(reason) => TestCaseResult::raised(tc, reason.clone()),
            };

            debug!(case = tc.id, success = result.success, "Case finished");
            results.push(result);
        }

        Ok((results, started.elapsed()))
    }
}
