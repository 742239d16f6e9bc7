//! Challenge runner: executes submitted solutions against structured test
//! cases in a child interpreter and grades the results.

pub mod config;
pub mod core;
pub mod executor;
pub mod jobs;
pub mod languages;
pub mod redis_manager;
pub mod runner;
pub mod runtime;

pub use crate::core::{
    compare, ExecutionError, ExecutionResult, TestCase, TestCaseResult, Verdict,
};
pub use executor::{ExecutionService, Executor, LanguageBackend};
pub use languages::{Language, LanguageRegistry};
