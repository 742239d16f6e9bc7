//! Run jobs: execute one submission and report its result

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::core::{ExecutionResult, TestCase};
use crate::executor::ExecutionService;
use crate::languages::Language;

/// Job received from the Redis queue
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunJob {
    pub submission_id: String,
    /// Challenge the submission belongs to; progress is published only when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_id: Option<String>,
    pub language: String,
    pub code: String,
    pub test_cases: Vec<TestCase>,
    /// Batch timeout; the worker default applies when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// Result of a run job, as pushed back to the submitter
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunJobResult {
    pub submission_id: String,
    #[serde(flatten)]
    pub result: ExecutionResult,
}

/// Published on the progress channel when a challenge run finishes
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub challenge_id: String,
    pub submission_id: String,
    pub success: bool,
}

impl RunJobResult {
    pub fn progress(&self, challenge_id: &str) -> ProgressEvent {
        ProgressEvent {
            challenge_id: challenge_id.to_string(),
            submission_id: self.submission_id.clone(),
            success: self.result.success,
        }
    }
}

/// Process a run job.
///
/// Never fails: errors that prevent the batch from running are reported as
/// a failed result so the submitter always gets an answer.
pub async fn process_run_job(job: &RunJob, service: &ExecutionService) -> RunJobResult {
    let total = job.test_cases.len();

    let outcome = match job.language.parse::<Language>() {
        Ok(language) => {
            let timeout = job.timeout_ms.map(Duration::from_millis);
            service
                .execute_code(&job.code, &job.test_cases, language, timeout)
                .await
        }
        Err(e) => Err(e),
    };

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            error!(
                submission_id = %job.submission_id,
                "Failed to run submission: {}", e
            );
            ExecutionResult::batch_failure(&e, total, Duration::ZERO)
        }
    };

    if result.verdict.is_environment_failure() {
        warn!(
            submission_id = %job.submission_id,
            "Run job could not start: {}",
            result.error.as_deref().unwrap_or_default()
        );
    } else {
        info!(
            submission_id = %job.submission_id,
            verdict = %result.verdict,
            passed = result.passed_tests,
            total = result.total_tests,
            "Run job completed"
        );
    }

    RunJobResult {
        submission_id: job.submission_id.clone(),
        result,
    }
}
