use serde::{Deserialize, Serialize};
use std::fmt;

/// Verdict of one execution batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accepted,
    WrongAnswer,
    RuntimeError,
    DefinitionError,
    TimeLimitExceeded,
    /// The language runtime could not be loaded; the submission was never run
    RuntimeUnavailable,
}

impl Verdict {
    /// Whether the failure lies with the environment rather than the submission
    pub fn is_environment_failure(&self) -> bool {
        matches!(self, Verdict::RuntimeUnavailable)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Accepted => "accepted",
            Verdict::WrongAnswer => "wrong_answer",
            Verdict::RuntimeError => "runtime_error",
            Verdict::DefinitionError => "definition_error",
            Verdict::TimeLimitExceeded => "time_limit_exceeded",
            Verdict::RuntimeUnavailable => "runtime_unavailable",
        };
        write!(f, "{}", s)
    }
}
