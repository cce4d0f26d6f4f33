//! `files.read_text`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;

use aether_protocols::{ActionError, HandlerContext, TaskHandler};

use crate::sandbox::Sandbox;

pub const DEFAULT_READ_MAX_BYTES: u64 = 200_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadResult {
    pub path: String,
    pub text: String,
    pub truncated: bool,
}

/// Read at most `max_bytes` from a sandboxed file.
///
/// One extra byte is read to detect truncation. Invalid UTF-8 is replaced.
pub async fn read_text(
    sandbox: &Sandbox,
    relative_path: &str,
    max_bytes: u64,
) -> Result<ReadResult, ActionError> {
    let path = sandbox.resolve(relative_path)?;
    let file = tokio::fs::File::open(&path).await?;

    let mut buf = Vec::new();
    file.take(max_bytes.saturating_add(1))
        .read_to_end(&mut buf)
        .await?;

    let truncated = buf.len() as u64 > max_bytes;
    if truncated {
        buf.truncate(max_bytes as usize);
    }

    Ok(ReadResult {
        path: path.display().to_string(),
        text: String::from_utf8_lossy(&buf).into_owned(),
        truncated,
    })
}

#[derive(Debug, Deserialize)]
struct ReadTextParams {
    path: String,
    #[serde(default)]
    max_bytes: Option<u64>,
}

/// Task handler for `files.read_text`.
pub struct ReadTextHandler {
    sandbox: Arc<Sandbox>,
    default_max_bytes: u64,
}

impl ReadTextHandler {
    pub fn new(sandbox: Arc<Sandbox>, default_max_bytes: u64) -> Self {
        Self {
            sandbox,
            default_max_bytes,
        }
    }
}

#[async_trait]
impl TaskHandler for ReadTextHandler {
    fn task_type(&self) -> &str {
        "files.read_text"
    }

    async fn handle(
        &self,
        payload: serde_json::Value,
        _ctx: HandlerContext,
    ) -> Result<serde_json::Value, ActionError> {
        let params: ReadTextParams = super::parse_params(payload)?;
        let max_bytes = params.max_bytes.unwrap_or(self.default_max_bytes);
        let result = read_text(&self.sandbox, &params.path, max_bytes).await?;
        super::to_value(&result)
    }
}

#[cfg(test)]
#[path = "read_text_tests.rs"]
mod tests;
