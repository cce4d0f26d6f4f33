//! Path sandbox.

use std::io;
use std::path::{Component, Path, PathBuf};

use aether_protocols::ActionError;

/// A base directory that relative action paths are confined to.
#[derive(Debug, Clone)]
pub struct Sandbox {
    base: PathBuf,
}

impl Sandbox {
    /// Create the base directory if needed and pin its canonical form.
    pub fn new(base: impl AsRef<Path>) -> io::Result<Self> {
        std::fs::create_dir_all(base.as_ref())?;
        let base = base.as_ref().canonicalize()?;
        Ok(Self { base })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Resolve `relative` to an absolute path inside the sandbox.
    ///
    /// The literal string is never trusted: `..` components and symlinks of
    /// existing ancestors are resolved first, then the result is
    /// prefix-checked against the base.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, ActionError> {
        let joined = self.base.join(relative);
        let resolved = resolve_existing_prefix(&normalize(&joined));

        if !resolved.starts_with(&self.base) {
            return Err(ActionError::Policy(format!(
                "Path escapes sandbox: {}",
                relative
            )));
        }
        Ok(resolved)
    }
}

/// Lexically fold `.` and `..` components.
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

/// Canonicalize the longest existing ancestor and re-append the rest.
fn resolve_existing_prefix(path: &Path) -> PathBuf {
    let mut existing = path.to_path_buf();
    let mut rest = Vec::new();

    loop {
        if let Ok(canonical) = existing.canonicalize() {
            let mut resolved = canonical;
            for part in rest.iter().rev() {
                resolved.push(part);
            }
            return resolved;
        }
        match (existing.file_name().map(|n| n.to_os_string()), existing.parent()) {
            (Some(name), Some(parent)) => {
                rest.push(name);
                existing = parent.to_path_buf();
            }
            _ => return path.to_path_buf(),
        }
    }
}
