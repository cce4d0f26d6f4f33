//! `files.write_text`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use aether_protocols::{ActionError, HandlerContext, TaskHandler};

use crate::sandbox::Sandbox;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteResult {
    pub path: String,
    pub bytes_written: usize,
}

/// Write `text` to `relative_path` inside the sandbox, creating parents.
pub async fn write_text(
    sandbox: &Sandbox,
    relative_path: &str,
    text: &str,
) -> Result<WriteResult, ActionError> {
    let path = sandbox.resolve(relative_path)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, text.as_bytes()).await?;

    debug!(path = %path.display(), bytes = text.len(), "Wrote file");
    Ok(WriteResult {
        path: path.display().to_string(),
        bytes_written: text.len(),
    })
}

#[derive(Debug, Deserialize)]
struct WriteTextParams {
    path: String,
    text: String,
}

/// Task handler for `files.write_text`.
pub struct WriteTextHandler {
    sandbox: Arc<Sandbox>,
}

impl WriteTextHandler {
    pub fn new(sandbox: Arc<Sandbox>) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl TaskHandler for WriteTextHandler {
    fn task_type(&self) -> &str {
        "files.write_text"
    }

    async fn handle(
        &self,
        payload: serde_json::Value,
        _ctx: HandlerContext,
    ) -> Result<serde_json::Value, ActionError> {
        let params: WriteTextParams = super::parse_params(payload)?;
        let result = write_text(&self.sandbox, &params.path, &params.text).await?;
        super::to_value(&result)
    }
}

#[cfg(test)]
#[path = "write_text_tests.rs"]
mod tests;
