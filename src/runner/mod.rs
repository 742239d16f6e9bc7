//! Runner module - child process plumbing for the language harnesses
//!
//! - `session`: a long-lived harness process spoken to over JSON lines
//! - `trusted`: one-shot execution of trusted helper commands (version checks)
//!
//! The runner module does NOT:
//! - Compare values or assign verdicts
//! - Know which language a harness speaks

pub mod session;
pub mod trusted;

use std::path::{Path, PathBuf};

/// Command specification for execution
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Program path or name
    pub program: String,
    /// Arguments to the program
    pub args: Vec<String>,
    /// Working directory
    pub work_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            work_dir: None,
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(|a| a.into()).collect();
        self
    }

    pub fn with_work_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.work_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Create from a command vector (first element is program, rest are args)
    pub fn from_vec(cmd: &[String]) -> Self {
        let mut iter = cmd.iter();
        let program = iter.next().cloned().unwrap_or_default();
        let args: Vec<String> = iter.cloned().collect();
        Self {
            program,
            args,
            work_dir: None,
        }
    }

    pub(crate) fn to_command(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.work_dir {
            command.current_dir(dir);
        }
        command
    }
}

/// Resource limits for a harness process
#[derive(Debug, Clone, Default)]
pub struct RunLimits {
    /// Address space limit in MB
    pub memory_mb: Option<u32>,
}

impl RunLimits {
    pub fn new(memory_mb: Option<u32>) -> Self {
        Self { memory_mb }
    }
}

/// Outcome of running a program to completion
#[derive(Debug)]
pub struct RunOutcome {
    /// Exit code (-1 if killed by a signal)
    pub exit_code: i32,
    /// Wall-clock time in milliseconds
    pub time_ms: u64,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutcome {
    /// Check if execution was successful (exited with code 0)
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

pub use session::{HarnessReply, HarnessRequest, HarnessSession};
pub use trusted::run_trusted;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec() {
        let cmd = CommandSpec::from_vec(&[
            "python3".to_string(),
            "-u".to_string(),
            "harness.py".to_string(),
        ]);
        assert_eq!(cmd.program, "python3");
        assert_eq!(cmd.args, vec!["-u", "harness.py"]);
        assert!(cmd.work_dir.is_none());

        let empty = CommandSpec::from_vec(&[]);
        assert_eq!(empty.program, "");
        assert!(empty.args.is_empty());
    }
}
