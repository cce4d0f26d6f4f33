//! `shell.exec`.

use std::collections::VecDeque;
use std::io;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use aether_actions_files::Sandbox;
use aether_protocols::{ActionError, HandlerContext, TaskHandler};

/// Which programs may run and how much output is kept.
#[derive(Debug, Clone)]
pub struct ShellPolicy {
    allowed: Vec<String>,
    tail_chars: usize,
}

impl ShellPolicy {
    pub fn new(allowed: Vec<String>, tail_chars: usize) -> Self {
        Self {
            allowed,
            tail_chars,
        }
    }

    pub fn is_allowed(&self, program: &str) -> bool {
        self.allowed.iter().any(|a| a == program)
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellResult {
    /// Exit status was zero.
    pub ok: bool,
    /// `None` when the process was ended by a signal.
    pub exit_code: Option<i32>,
    pub stdout_tail: String,
    pub stderr_tail: String,
    pub argv: Vec<String>,
}

/// Last `max` characters of `s`.
pub fn tail_chars(s: &str, max: usize) -> String {
    let count = s.chars().count();
    if count <= max {
        return s.to_string();
    }
    s.chars().skip(count - max).collect()
}

/// Bytes to retain so `max_chars` whole characters survive a cut that
/// lands inside a multi-byte sequence.
fn tail_byte_cap(max_chars: usize) -> usize {
    max_chars.saturating_add(1).saturating_mul(4)
}

/// Drain `reader`, keeping only its last `max_bytes` bytes.
pub async fn read_tail<R: AsyncRead + Unpin>(
    reader: Option<R>,
    max_bytes: usize,
) -> io::Result<Vec<u8>> {
    let Some(mut reader) = reader else {
        return Ok(Vec::new());
    };
    let mut tail = VecDeque::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        tail.extend(&chunk[..n]);
        let excess = tail.len().saturating_sub(max_bytes);
        if excess > 0 {
            tail.drain(..excess);
        }
    }
    Ok(tail.into())
}

/// Run `argv` inside the sandbox.
///
/// `argv[0]` must be on the allowlist; otherwise nothing is spawned. The
/// child is killed when `timeout_s` expires. A non-zero exit is reported in
/// the result, not as an error.
pub async fn shell(
    policy: &ShellPolicy,
    sandbox: &Sandbox,
    argv: &[String],
    timeout_s: u64,
    cwd_relative: &str,
) -> Result<ShellResult, ActionError> {
    let Some(program) = argv.first() else {
        return Err(ActionError::Policy("Empty command".to_string()));
    };
    if !policy.is_allowed(program) {
        return Err(ActionError::Policy(format!("Command not allowed: {}", program)));
    }

    let cwd = sandbox.resolve(cwd_relative)?;

    let mut child = Command::new(program)
        .args(&argv[1..])
        .current_dir(&cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    debug!(program = %program, cwd = %cwd.display(), "Spawned process");

    let cap = tail_byte_cap(policy.tail_chars);
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let run = async {
        tokio::try_join!(
            read_tail(stdout, cap),
            read_tail(stderr, cap),
            child.wait()
        )
    };

    // On expiry the child is dropped on return, which kills it.
    let (stdout, stderr, status) = match timeout(Duration::from_secs(timeout_s), run).await {
        Ok(output) => output?,
        Err(_) => {
            warn!(program = %program, timeout_s, "Process timed out and was killed");
            return Err(ActionError::Timeout(timeout_s));
        }
    };

    let stdout = String::from_utf8_lossy(&stdout);
    let stderr = String::from_utf8_lossy(&stderr);

    Ok(ShellResult {
        ok: status.success(),
        exit_code: status.code(),
        stdout_tail: tail_chars(&stdout, policy.tail_chars),
        stderr_tail: tail_chars(&stderr, policy.tail_chars),
        argv: argv.to_vec(),
    })
}

#[derive(Debug, Deserialize)]
struct ExecParams {
    #[serde(alias = "argv")]
    cmd: Vec<String>,
    #[serde(default)]
    cwd_rel: String,
}

/// Task handler for `shell.exec`.
pub struct ShellExecHandler {
    policy: Arc<ShellPolicy>,
    sandbox: Arc<Sandbox>,
}

impl ShellExecHandler {
    pub fn new(policy: Arc<ShellPolicy>, sandbox: Arc<Sandbox>) -> Self {
        Self { policy, sandbox }
    }
}

#[async_trait]
impl TaskHandler for ShellExecHandler {
    fn task_type(&self) -> &str {
        "shell.exec"
    }

    async fn handle(
        &self,
        payload: serde_json::Value,
        ctx: HandlerContext,
    ) -> Result<serde_json::Value, ActionError> {
        let params: ExecParams = serde_json::from_value(payload)
            .map_err(|e| ActionError::InvalidPayload(e.to_string()))?;

        let result = shell(
            &self.policy,
            &self.sandbox,
            &params.cmd,
            ctx.timeout_s,
            &params.cwd_rel,
        )
        .await?;

        serde_json::to_value(&result).map_err(|e| ActionError::ExecutionFailed(e.to_string()))
    }
}

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
