use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ExecutionError;
use super::verdict::Verdict;

/// One input/expected-output pair of a challenge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: u32,
    /// Positional arguments passed to the solution
    pub input: Vec<Value>,
    pub expected: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TestCase {
    pub fn new(id: u32, input: Vec<Value>, expected: Value) -> Self {
        Self {
            id,
            input,
            expected,
            description: None,
        }
    }
}

/// Reject batches whose test case ids are not unique
pub fn validate_batch(test_cases: &[TestCase]) -> Result<(), ExecutionError> {
    let mut seen = HashSet::with_capacity(test_cases.len());
    for tc in test_cases {
        if !seen.insert(tc.id) {
            return Err(ExecutionError::InvalidBatch(format!(
                "duplicate test case id {}",
                tc.id
            )));
        }
    }
    Ok(())
}

/// Outcome of a single test case
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseResult {
    pub id: u32,
    pub success: bool,
    pub input: Vec<Value>,
    pub expected: Value,
    /// Value produced by the solution; absent when the call raised
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    /// Error raised by the solution for this input
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestCaseResult {
    /// The solution returned a value; grade it
    pub fn returned(tc: &TestCase, actual: Value) -> Self {
        Self {
            id: tc.id,
            success: super::compare(&actual, &tc.expected),
            input: tc.input.clone(),
            expected: tc.expected.clone(),
            actual: Some(actual),
            error: None,
        }
    }

    /// The solution raised for this input
    pub fn raised(tc: &TestCase, error: impl Into<String>) -> Self {
        Self {
            id: tc.id,
            success: false,
            input: tc.input.clone(),
            expected: tc.expected.clone(),
            actual: None,
            error: Some(error.into()),
        }
    }
}

/// Result of executing one submission against its test cases
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,
    pub verdict: Verdict,
    pub passed_tests: usize,
    pub total_tests: usize,
    /// One entry per test case, in input order; absent on batch failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_results: Option<Vec<TestCaseResult>>,
    /// Batch-level failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock milliseconds spent defining the solution and running the cases
    pub execution_time: u64,
}

impl ExecutionResult {
    /// Aggregate per-case results of a batch that ran to completion
    pub fn from_cases(test_results: Vec<TestCaseResult>, elapsed: Duration) -> Self {
        let total_tests = test_results.len();
        let passed_tests = test_results.iter().filter(|r| r.success).count();

        let verdict = if passed_tests == total_tests {
            Verdict::Accepted
        } else if test_results.iter().any(|r| !r.success && r.error.is_none()) {
            Verdict::WrongAnswer
        } else {
            Verdict::RuntimeError
        };

        Self {
            success: passed_tests == total_tests,
            verdict,
            passed_tests,
            total_tests,
            test_results: Some(test_results),
            error: None,
            execution_time: elapsed.as_millis() as u64,
        }
    }

    /// A batch-level failure: nothing is graded and no partial results are kept
    pub fn batch_failure(error: &ExecutionError, total_tests: usize, elapsed: Duration) -> Self {
        let verdict = match error {
            ExecutionError::RuntimeUnavailable(_) => Verdict::RuntimeUnavailable,
            ExecutionError::Definition(_) => Verdict::DefinitionError,
            ExecutionError::Timeout(_) => Verdict::TimeLimitExceeded,
            _ => Verdict::RuntimeError,
        };

        Self {
            success: false,
            verdict,
            passed_tests: 0,
            total_tests,
            test_results: None,
            error: Some(error.to_string()),
            execution_time: elapsed.as_millis() as u64,
        }
    }

    /// Failed test case results, for display
    pub fn failures(&self) -> impl Iterator<Item = &TestCaseResult> {
        self.test_results
            .iter()
            .flatten()
            .filter(|r| !r.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn case(id: u32, expected: Value) -> TestCase {
        TestCase::new(id, vec![json!(id)], expected)
    }

    #[test]
    fn test_all_pass() {
        let results = vec![
            TestCaseResult::returned(&case(1, json!(1)), json!(1)),
            TestCaseResult::returned(&case(2, json!([1, 2])), json!([1, 2])),
        ];
        let result = ExecutionResult::from_cases(results, Duration::from_millis(12));

        assert!(result.success);
        assert_eq!(result.verdict, Verdict::Accepted);
        assert_eq!(result.passed_tests, 2);
        assert_eq!(result.total_tests, 2);
        assert_eq!(result.execution_time, 12);
        assert_eq!(result.failures().count(), 0);
    }

    #[test]
    fn test_mismatch_is_wrong_answer() {
        let results = vec![
            TestCaseResult::returned(&case(1, json!(1)), json!(1)),
            TestCaseResult::raised(&case(2, json!(2)), "ZeroDivisionError: division by zero"),
            TestCaseResult::returned(&case(3, json!(3)), json!("3")),
        ];
        let result = ExecutionResult::from_cases(results, Duration::ZERO);

        assert!(!result.success);
        assert_eq!(result.verdict, Verdict::WrongAnswer);
        assert_eq!(result.passed_tests, 1);
        let failed: Vec<u32> = result.failures().map(|r| r.id).collect();
        assert_eq!(failed, vec![2, 3]);
    }

    #[test]
    fn test_only_errors_is_runtime_error() {
        let results = vec![
            TestCaseResult::returned(&case(1, json!(1)), json!(1)),
            TestCaseResult::raised(&case(2, json!(2)), "TypeError: boom"),
        ];
        let result = ExecutionResult::from_cases(results, Duration::ZERO);

        assert_eq!(result.verdict, Verdict::RuntimeError);
        let failed = result.failures().next().unwrap();
        assert!(failed.actual.is_none());
        assert_eq!(failed.error.as_deref(), Some("TypeError: boom"));
    }

    #[test]
    fn test_batch_failure_has_no_results() {
        let error = ExecutionError::Timeout(100);
        let result = ExecutionResult::batch_failure(&error, 3, Duration::from_millis(101));

        assert!(!result.success);
        assert_eq!(result.verdict, Verdict::TimeLimitExceeded);
        assert_eq!(result.total_tests, 3);
        assert_eq!(result.passed_tests, 0);
        assert!(result.test_results.is_none());
        assert!(result.error.unwrap().starts_with("Execution timed out"));
    }

    #[test]
    fn test_runtime_unavailable_verdict() {
        let error = ExecutionError::RuntimeUnavailable("python3 not found".into());
        let result = ExecutionResult::batch_failure(&error, 1, Duration::ZERO);
        assert!(result.verdict.is_environment_failure());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let cases = vec![case(1, json!(1)), case(2, json!(2)), case(1, json!(3))];
        assert!(matches!(
            validate_batch(&cases),
            Err(ExecutionError::InvalidBatch(_))
        ));
        assert!(validate_batch(&cases[..2]).is_ok());
    }

    #[test]
    fn test_wire_format() {
        let raw = r#"{"id": 1, "input": [[2, 7, 11, 15], 9], "expected": [0, 1]}"#;
        let tc: TestCase = serde_json::from_str(raw).unwrap();
        assert_eq!(tc.input.len(), 2);
        assert!(tc.description.is_none());

        let result = ExecutionResult::from_cases(
            vec![TestCaseResult::returned(&tc, json!([0, 1]))],
            Duration::from_millis(3),
        );
        let encoded = serde_json::to_value(&result).unwrap();
        assert_eq!(encoded["passedTests"], json!(1));
        assert_eq!(encoded["totalTests"], json!(1));
        assert_eq!(encoded["executionTime"], json!(3));
        assert_eq!(encoded["verdict"], json!("accepted"));
        assert!(encoded.get("error").is_none());
        assert_eq!(encoded["testResults"][0]["actual"], json!([0, 1]));
    }
}
