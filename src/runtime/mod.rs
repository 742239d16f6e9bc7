//! Runtime module - access to the dynamic-language runtime
//!
//! - `bootstrap`: locating and verifying an interpreter, installing its harness
//! - `loader`: exactly-once, retryable acquisition of the runtime handle
//! - `handle`: the runtime handle and the per-batch namespaces it opens

pub mod bootstrap;
pub mod handle;
pub mod loader;

pub use bootstrap::{HarnessInstall, InterpreterBootstrap, RuntimeBootstrap};
pub use handle::{Namespace, RuntimeHandle};
pub use loader::{LoaderStatus, RuntimeLoader};
