//! Core data model shared by the executors and their callers
//!
//! - `model`: test cases and execution results
//! - `compare`: structural equality used to grade every case
//! - `value`: runtime values crossing back from an interpreter
//! - `verdict`: batch-level verdicts
//! - `error`: the execution error taxonomy

pub mod compare;
pub mod error;
pub mod model;
pub mod value;
pub mod verdict;

pub use compare::compare;
pub use error::ExecutionError;
pub use model::{ExecutionResult, TestCase, TestCaseResult};
pub use value::{RuntimeValue, ToHostValue};
pub use verdict::Verdict;
