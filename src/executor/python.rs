//! Dynamic backend: Python, acquired through the runtime loader

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::LanguageBackend;
use crate::core::{ExecutionError, RuntimeValue};
use crate::languages::Language;
use crate::runtime::{Namespace, RuntimeLoader};

pub struct PythonBackend {
    loader: Arc<RuntimeLoader>,
}

impl PythonBackend {
    pub fn new(loader: Arc<RuntimeLoader>) -> Self {
        Self { loader }
    }
}

#[async_trait]
impl LanguageBackend for PythonBackend {
    type Solution = Namespace;

    fn language(&self) -> Language {
        Language::Dynamic
    }

    async fn warm_up(&self) -> Result<(), ExecutionError> {
        self.loader.acquire().await.map(|_| ())
    }

    async fn prepare(&self, code: &str) -> Result<Namespace, ExecutionError> {
        let runtime = self.loader.acquire().await?;
        let mut namespace = runtime.open_namespace().await?;
        namespace.define(code).await?;
        Ok(namespace)
    }

    async fn invoke(
        &self,
        namespace: &mut Namespace,
        args: &[Value],
    ) -> Result<Value, ExecutionError> {
        namespace.call::<RuntimeValue>(args).await
    }
}
