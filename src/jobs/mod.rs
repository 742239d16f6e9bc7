pub mod run;

use serde::{Deserialize, Serialize};

use crate::jobs::run::RunJob;

/// Worker job enum - represents different types of jobs the worker can process
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "job_type")]
pub enum WorkerJob {
    /// Run a submission against its test cases
    #[serde(rename = "run")]
    Run(RunJob),
}
