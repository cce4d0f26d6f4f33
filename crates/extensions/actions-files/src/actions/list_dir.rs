//! `files.list_dir`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use aether_protocols::{ActionError, HandlerContext, TaskHandler};

use crate::sandbox::Sandbox;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    /// Present for regular files only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirListing {
    pub path: String,
    pub items: Vec<DirEntry>,
}

/// List a sandboxed directory, entries sorted by name.
pub async fn list_dir(sandbox: &Sandbox, relative_path: &str) -> Result<DirListing, ActionError> {
    let path = sandbox.resolve(relative_path)?;

    let is_dir = tokio::fs::metadata(&path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Err(ActionError::NotADirectory(relative_path.to_string()));
    }

    let mut items = Vec::new();
    let mut entries = tokio::fs::read_dir(&path).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        // Follows symlinks, like a plain stat.
        let (is_dir, size) = match tokio::fs::metadata(entry.path()).await {
            Ok(meta) if meta.is_file() => (false, Some(meta.len())),
            Ok(meta) => (meta.is_dir(), None),
            Err(_) => (false, None),
        };
        items.push(DirEntry { name, is_dir, size });
    }
    items.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(DirListing {
        path: path.display().to_string(),
        items,
    })
}

#[derive(Debug, Default, Deserialize)]
struct ListDirParams {
    #[serde(default)]
    path: String,
}

/// Task handler for `files.list_dir`.
pub struct ListDirHandler {
    sandbox: Arc<Sandbox>,
}

impl ListDirHandler {
    pub fn new(sandbox: Arc<Sandbox>) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl TaskHandler for ListDirHandler {
    fn task_type(&self) -> &str {
        "files.list_dir"
    }

    async fn handle(
        &self,
        payload: serde_json::Value,
        _ctx: HandlerContext,
    ) -> Result<serde_json::Value, ActionError> {
        let params: ListDirParams = if payload.is_null() {
            ListDirParams::default()
        } else {
            super::parse_params(payload)?
        };
        let result = list_dir(&self.sandbox, &params.path).await?;
        super::to_value(&result)
    }
}

#[cfg(test)]
#[path = "list_dir_tests.rs"]
mod tests;
