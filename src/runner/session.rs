//! Harness session - one interpreter process driven over JSON lines
//!
//! A session is the namespace of one batch: the submission is defined in it
//! once and then called per test case. The process runs in its own process
//! group and the whole group is killed when the session is dropped, whether
//! the batch finished, failed or was cancelled by its timeout.

use std::io;
use std::process::Stdio;

use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::task::JoinHandle;
use tracing::debug;

use super::{CommandSpec, RunLimits};
use crate::core::ExecutionError;

/// Longest reply excerpt quoted in protocol errors
const REPLY_EXCERPT_CHARS: usize = 200;

/// Request sent to a harness
#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum HarnessRequest<'a> {
    /// Evaluate the submission and bind its entry point
    Define { code: &'a str, entry: &'a str },
    /// Call the bound entry point with positional arguments
    Call { args: &'a [Value] },
}

/// Reply from a harness
#[derive(Debug, Deserialize)]
pub struct HarnessReply<T> {
    pub ok: bool,
    pub value: Option<T>,
    pub error: Option<String>,
}

impl<T> HarnessReply<T> {
    /// Split into the returned value or the error raised by user code
    pub fn into_result(self) -> Result<Option<T>, String> {
        if self.ok {
            Ok(self.value)
        } else {
            Err(self
                .error
                .unwrap_or_else(|| "harness reported an unknown error".to_string()))
        }
    }
}

pub struct HarnessSession {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    pgid: Option<Pid>,
    stderr_task: JoinHandle<()>,
}

impl HarnessSession {
    /// Start a harness process
    pub async fn spawn(cmd: &CommandSpec, limits: &RunLimits) -> io::Result<Self> {
        let mut command = cmd.to_command();
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .process_group(0);

        if let Some(memory_mb) = limits.memory_mb {
            let bytes = u64::from(memory_mb) * 1024 * 1024;
            // SAFETY: setrlimit is async-signal-safe and touches no parent state.
            unsafe {
                command.pre_exec(move || {
                    nix::sys::resource::setrlimit(nix::sys::resource::Resource::RLIMIT_AS, bytes, bytes)
                        .map_err(io::Error::from)
                });
            }
        }

        let mut child = command.spawn()?;
        let pgid = child.id().map(|pid| Pid::from_raw(pid as i32));

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "harness stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "harness stdout unavailable"))?;

        // User output goes to stderr; keep draining it so the child never blocks
        let stderr = child.stderr.take();
        let program = cmd.program.clone();
        let stderr_task = tokio::spawn(async move {
            let Some(stderr) = stderr else {
                return;
            };
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(program = %program, "harness output: {}", line);
            }
        });

        debug!(program = %cmd.program, pid = ?pgid, "Harness session started");

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            pgid,
            stderr_task,
        })
    }

    /// Send one request and wait for its reply.
    ///
    /// Errors mean the session itself is unusable (the process died or broke
    /// the protocol); errors raised by user code arrive inside the reply.
    pub async fn request<T: DeserializeOwned>(
        &mut self,
        request: &HarnessRequest<'_>,
    ) -> Result<HarnessReply<T>, ExecutionError> {
        let mut line =
            serde_json::to_string(request).map_err(|e| ExecutionError::Protocol(e.to_string()))?;
        line.push('\n');

        if let Err(e) = self.write_line(&line).await {
            return Err(self.lost(e));
        }

        let reply = match self.stdout.next_line().await {
            Ok(Some(reply)) => reply,
            Ok(None) => return Err(self.exited()),
            Err(e) => return Err(self.lost(e)),
        };

        serde_json::from_str(&reply).map_err(|e| {
            let excerpt: String = reply.chars().take(REPLY_EXCERPT_CHARS).collect();
            ExecutionError::Protocol(format!("malformed harness reply ({}): {}", e, excerpt))
        })
    }

    async fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await
    }

    fn lost(&mut self, e: io::Error) -> ExecutionError {
        if e.kind() == io::ErrorKind::BrokenPipe {
            self.exited()
        } else {
            ExecutionError::Io(e)
        }
    }

    fn exited(&mut self) -> ExecutionError {
        let status = match self.child.try_wait() {
            Ok(Some(status)) => format!(" ({})", status),
            _ => String::new(),
        };
        ExecutionError::Protocol(format!("interpreter exited unexpectedly{}", status))
    }
}

impl Drop for HarnessSession {
    fn drop(&mut self) {
        if let Some(pgid) = self.pgid {
            let _ = killpg(pgid, Signal::SIGKILL);
        }
        self.stderr_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// A shell stand-in for a harness: answers every request line with a fixed reply
    fn echo_harness(reply: &str) -> CommandSpec {
        let script = format!("while read line; do echo '{}'; done", reply);
        CommandSpec::new("sh").with_args(["-c".to_string(), script])
    }

    #[test]
    fn test_request_encoding() {
        let define = serde_json::to_value(HarnessRequest::Define {
            code: "def solution(): pass",
            entry: "solution",
        })
        .unwrap();
        assert_eq!(
            define,
            json!({"op": "define", "code": "def solution(): pass", "entry": "solution"})
        );

        let args = vec![json!([1, 2]), json!(3)];
        let call = serde_json::to_value(HarnessRequest::Call { args: &args }).unwrap();
        assert_eq!(call, json!({"op": "call", "args": [[1, 2], 3]}));
    }

    #[test]
    fn test_reply_decoding() {
        let ok: HarnessReply<Value> = serde_json::from_str(r#"{"ok": true, "value": [0, 1]}"#).unwrap();
        assert_eq!(ok.into_result().unwrap(), Some(json!([0, 1])));

        let defined: HarnessReply<Value> = serde_json::from_str(r#"{"ok": true}"#).unwrap();
        assert_eq!(defined.into_result().unwrap(), None);

        let failed: HarnessReply<Value> =
            serde_json::from_str(r#"{"ok": false, "error": "ValueError: bad"}"#).unwrap();
        assert_eq!(failed.into_result().unwrap_err(), "ValueError: bad");
    }

    #[tokio::test]
    async fn test_round_trip_over_process() {
        let cmd = echo_harness(r#"{"ok": true, "value": 42}"#);
        let mut session = HarnessSession::spawn(&cmd, &RunLimits::default()).await.unwrap();

        for _ in 0..3 {
            let reply: HarnessReply<Value> = session
                .request(&HarnessRequest::Call { args: &[] })
                .await
                .unwrap();
            assert_eq!(reply.into_result().unwrap(), Some(json!(42)));
        }
    }

    #[tokio::test]
    async fn test_dead_process_is_reported() {
        let cmd = CommandSpec::new("sh").with_args(["-c", "exit 0"]);
        let mut session = HarnessSession::spawn(&cmd, &RunLimits::default()).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        let err = session
            .request::<Value>(&HarnessRequest::Call { args: &[] })
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Protocol(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_garbage_reply_is_protocol_error() {
        let cmd = echo_harness("not json");
        let mut session = HarnessSession::spawn(&cmd, &RunLimits::default()).await.unwrap();

        let err = session
            .request::<Value>(&HarnessRequest::Call { args: &[] })
            .await
            .unwrap_err();
        match err {
            ExecutionError::Protocol(message) => assert!(message.contains("not json")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
