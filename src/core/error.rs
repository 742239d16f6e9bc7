use thiserror::Error;

/// Errors raised while executing a submission.
///
/// `RuntimeUnavailable`, `Definition` and `Timeout` are batch-level and end
/// up in `ExecutionResult::error`. `Invocation` is case-level and is recorded
/// on a single `TestCaseResult`. The remaining variants are caller contract
/// violations or host failures and are returned as `Err`.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Runtime unavailable: {0}. Please reload and try again.")]
    RuntimeUnavailable(String),

    #[error("{0}")]
    Definition(String),

    #[error("{0}")]
    Invocation(String),

    #[error("Execution timed out after {0} ms")]
    Timeout(u64),

    #[error("Invalid test case batch: {0}")]
    InvalidBatch(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Harness protocol error: {0}")]
    Protocol(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ExecutionError {
    /// Batch-level failures are reported inside an `ExecutionResult`
    pub fn is_batch_level(&self) -> bool {
        matches!(
            self,
            ExecutionError::RuntimeUnavailable(_)
                | ExecutionError::Definition(_)
                | ExecutionError::Timeout(_)
        )
    }
}
