use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::core::{ExecutionError, ToHostValue};
use crate::runner::{CommandSpec, HarnessReply, HarnessRequest, HarnessSession, RunLimits};
use crate::runtime::bootstrap::HarnessInstall;

/// A verified interpreter, able to open fresh namespaces
#[derive(Debug)]
pub struct RuntimeHandle {
    command: CommandSpec,
    limits: RunLimits,
    entry_point: String,
    version: String,
    /// Keeps the installed harness alive as long as the handle
    _install: Option<HarnessInstall>,
}

impl RuntimeHandle {
    pub fn new(
        command: CommandSpec,
        limits: RunLimits,
        entry_point: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            command,
            limits,
            entry_point: entry_point.into(),
            version: version.into(),
            _install: None,
        }
    }

    /// Handle whose command runs a harness installed for it
    pub fn installed(
        install: HarnessInstall,
        run_command: &[String],
        limits: RunLimits,
        entry_point: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        let command = CommandSpec::from_vec(run_command).with_work_dir(install.dir());
        Self {
            _install: Some(install),
            ..Self::new(command, limits, entry_point, version)
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Open a namespace that no other batch has seen
    pub async fn open_namespace(&self) -> Result<Namespace, ExecutionError> {
        Namespace::open(&self.command, &self.limits, &self.entry_point).await
    }
}

/// Globals of one batch, living in their own interpreter process.
///
/// Dropping the namespace kills the process.
pub struct Namespace {
    session: HarnessSession,
    entry_point: String,
}

impl Namespace {
    pub async fn open(
        command: &CommandSpec,
        limits: &RunLimits,
        entry_point: &str,
    ) -> Result<Self, ExecutionError> {
        let session = HarnessSession::spawn(command, limits).await?;
        Ok(Self {
            session,
            entry_point: entry_point.to_string(),
        })
    }

    /// Run the submission's source and bind its entry point.
    ///
    /// Only the submission runs during a define, so an interpreter that dies
    /// or breaks the protocol here is a `Definition` error.
    pub async fn define(&mut self, code: &str) -> Result<(), ExecutionError> {
        let request = HarnessRequest::Define {
            code,
            entry: &self.entry_point,
        };
        let reply: HarnessReply<Value> = match self.session.request(&request).await {
            Ok(reply) => reply,
            Err(ExecutionError::Protocol(message)) => {
                debug!(entry_point = %self.entry_point, "Interpreter lost during define: {}", message);
                return Err(ExecutionError::Definition(message));
            }
            Err(e) => return Err(e),
        };

        reply
            .into_result()
            .map(|_| ())
            .map_err(ExecutionError::Definition)
    }

    /// Call the entry point, converting the runtime's value model `V` into a host value.
    ///
    /// An exception raised by the call is `ExecutionError::Invocation`; any
    /// other error means the namespace is gone.
    pub async fn call<V>(&mut self, args: &[Value]) -> Result<Value, ExecutionError>
    where
        V: DeserializeOwned + ToHostValue,
    {
        let reply: HarnessReply<V> = self.session.request(&HarnessRequest::Call { args }).await?;

        match reply.into_result() {
            Ok(value) => Ok(value.map(|v| v.to_host_value()).unwrap_or(Value::Null)),
            Err(message) => {
                debug!(entry_point = %self.entry_point, "Solution raised: {}", message);
                Err(ExecutionError::Invocation(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn define_with(script: &str) -> Result<(), ExecutionError> {
        let command = CommandSpec::new("sh").with_args(["-c", script]);
        let mut namespace = Namespace::open(&command, &RunLimits::default(), "solution")
            .await
            .unwrap();
        namespace.define("def solution(): pass").await
    }

    #[tokio::test]
    async fn test_exit_during_define_is_definition_error() {
        let err = define_with("read line; exit 3").await.unwrap_err();
        match err {
            ExecutionError::Definition(message) => {
                assert!(message.contains("exited unexpectedly"), "{}", message)
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stray_output_during_define_is_definition_error() {
        let err = define_with("read line; echo hello").await.unwrap_err();
        match err {
            ExecutionError::Definition(message) => assert!(message.contains("hello"), "{}", message),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_a_host_error() {
        let command = CommandSpec::new("no-such-interpreter-binary");
        let err = Namespace::open(&command, &RunLimits::default(), "solution")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ExecutionError::Io(_)), "{:?}", err);
    }
}
