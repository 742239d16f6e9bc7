//! Trusted runner implementation
//!
//! Runs trusted helper commands (interpreter version checks) to completion,
//! bounded by a timeout.

use std::io;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tracing::debug;

use super::{CommandSpec, RunOutcome};

/// Run a trusted command directly and collect its output
pub async fn run_trusted(
    cmd: &CommandSpec,
    timeout: Duration,
) -> io::Result<RunOutcome> {
    debug!(
        "Running trusted program: {} with args: {:?}",
        cmd.program, cmd.args
    );

    let mut command = cmd.to_command();
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let start = Instant::now();
    let child = command.spawn()?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| {
            io::Error::new(
                io::ErrorKind::TimedOut,
                format!("{} did not finish within {} ms", cmd.program, timeout.as_millis()),
            )
        })??;

    Ok(RunOutcome {
        exit_code: output.status.code().unwrap_or(-1),
        time_ms: start.elapsed().as_millis() as u64,
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_not_found() {
        let cmd = CommandSpec::new("definitely-not-an-installed-interpreter");
        let err = run_trusted(&cmd, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_collects_output() {
        let cmd = CommandSpec::new("sh").with_args(["-c", "echo got ping; echo warn >&2; exit 3"]);
        let outcome = run_trusted(&cmd, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(outcome.stdout.trim(), "got ping");
        assert_eq!(outcome.stderr.trim(), "warn");
        assert_eq!(outcome.exit_code, 3);
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_timeout() {
        let cmd = CommandSpec::new("sleep").with_args(["5"]);
        let err = run_trusted(&cmd, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }
}
