//! Access to the TrueNAS middleware.
//!
//! `Midclt` shells out to the `midclt` command-line client for every call.
//! `DatasetClient` wraps the four dataset endpoints the reconciler uses.

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum MiddlewareError {
    #[error("failed to run {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{method} failed: {message}")]
    Call { method: String, message: String },

    #[error("{method} returned invalid JSON: {source}")]
    InvalidResponse {
        method: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A middleware method call. Errors carry the remote message verbatim.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, MiddlewareError>;
}

/// Middleware client backed by the `midclt` binary.
pub struct Midclt {
    binary: String,
}

impl Midclt {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for Midclt {
    fn default() -> Self {
        Self::new("midclt")
    }
}

#[async_trait]
impl Middleware for Midclt {
    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, MiddlewareError> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("call").arg(method);
        for arg in &args {
            cmd.arg(arg.to_string());
        }

        debug!(method = %method, args = args.len(), "Calling middleware");

        let output = cmd.output().await.map_err(|source| MiddlewareError::Spawn {
            binary: self.binary.clone(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = if stderr.trim().is_empty() {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(MiddlewareError::Call {
                method: method.to_string(),
                message,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_output(method, stdout.trim())
    }
}

/// `midclt` prints JSON for structured results and bare text for strings.
fn parse_output(method: &str, stdout: &str) -> Result<Value, MiddlewareError> {
    if stdout.is_empty() {
        return Ok(Value::Null);
    }
    match serde_json::from_str(stdout) {
        Ok(value) => Ok(value),
        Err(source) if stdout.starts_with(['[', '{']) => Err(MiddlewareError::InvalidResponse {
            method: method.to_string(),
            source,
        }),
        Err(_) => Ok(Value::String(stdout.to_string())),
    }
}

/// Typed wrapper for the `pool.dataset.*` endpoints.
pub struct DatasetClient<'a> {
    mw: &'a dyn Middleware,
}

impl<'a> DatasetClient<'a> {
    pub fn new(mw: &'a dyn Middleware) -> Self {
        Self { mw }
    }

    /// Query datasets whose name equals `name`.
    pub async fn query(&self, name: &str) -> Result<Value, MiddlewareError> {
        self.mw
            .call("pool.dataset.query", vec![json!([["name", "=", name]])])
            .await
    }

    pub async fn create(&self, payload: &Map<String, Value>) -> Result<Value, MiddlewareError> {
        info!(name = ?payload.get("name"), "Creating dataset");
        self.mw
            .call("pool.dataset.create", vec![Value::Object(payload.clone())])
            .await
    }

    pub async fn update(
        &self,
        name: &str,
        payload: &Map<String, Value>,
    ) -> Result<Value, MiddlewareError> {
        info!(name = %name, keys = ?payload.keys().collect::<Vec<_>>(), "Updating dataset");
        self.mw
            .call(
                "pool.dataset.update",
                vec![json!(name), Value::Object(payload.clone())],
            )
            .await
    }

    pub async fn delete(&self, name: &str, recursive: bool) -> Result<(), MiddlewareError> {
        info!(name = %name, recursive, "Deleting dataset");
        self.mw
            .call(
                "pool.dataset.delete",
                vec![json!(name), json!({"recursive": recursive})],
            )
            .await?;
        Ok(())
    }
}
