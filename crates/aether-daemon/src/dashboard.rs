//! Atomic read-merge-write of the shared status document.

use std::io::Write;
use std::path::{Component, Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::DaemonError;

#[cfg(test)]
#[path = "dashboard_tests.rs"]
mod tests;

/// Writes one top-level key of a JSON document shared with other writers.
///
/// The target must lie under `allowed_prefix`; anything else is skipped
/// without touching the filesystem.
#[derive(Debug, Clone)]
pub struct DashboardWriter {
    path: PathBuf,
    allowed_prefix: PathBuf,
}

impl DashboardWriter {
    pub fn new(path: impl Into<PathBuf>, allowed_prefix: impl Into<PathBuf>) -> Self {
        Self {
            path: normalize(&path.into()),
            allowed_prefix: normalize(&allowed_prefix.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_allowed(&self) -> bool {
        self.path.is_absolute() && self.path.starts_with(&self.allowed_prefix)
    }

    /// Replace `key` in the document, preserving every other key.
    ///
    /// Returns `false` when the path is outside the allowed prefix.
    pub fn merge(&self, key: &str, value: Value) -> Result<bool, DaemonError> {
        if !self.is_allowed() {
            debug!(path = %self.path.display(), "Dashboard path outside data dir, skipping");
            return Ok(false);
        }

        let dir = self
            .path
            .parent()
            .ok_or_else(|| DaemonError::InvalidPath(self.path.clone()))?;
        std::fs::create_dir_all(dir)?;

        let mut doc = self.read_existing();
        doc.insert(key.to_string(), value);

        let tmp = dir.join(format!(".aether_dashboard.{}.tmp", Uuid::new_v4().simple()));
        let written = write_file(&tmp, &Value::Object(doc))
            .and_then(|()| std::fs::rename(&tmp, &self.path).map_err(DaemonError::from));
        if written.is_err() {
            let _ = std::fs::remove_file(&tmp);
        }
        written.map(|()| true)
    }

    /// Current document as an object. Missing, unreadable or non-object
    /// content starts over from an empty document.
    pub fn read_existing(&self) -> Map<String, Value> {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return Map::new();
        };
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Dashboard unreadable, rewriting");
                Map::new()
            }
        }
    }
}

fn write_file(path: &Path, doc: &Value) -> Result<(), DaemonError> {
    let mut file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(&mut file, doc)?;
    file.write_all(b"\n")?;
    file.sync_all()?;
    Ok(())
}

/// Lexical normalization: drops `.` and resolves `..` against earlier parts.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
