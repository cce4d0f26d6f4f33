//! Command protocol.
//!
//! Commands are the chat-style surface of the runtime. Each one claims a
//! family of inputs through [`Command::can_handle`] and produces a
//! [`CommandOutcome`] document.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CommandError;
use crate::registry::Registerable;

/// Result document of a routed command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub ok: bool,
    /// Name of the command that produced this outcome.
    pub command: String,
    /// Human-readable text.
    pub message: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
}

impl CommandOutcome {
    pub fn ok(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            command: command.into(),
            message: message.into(),
            data: serde_json::Value::Null,
        }
    }

    pub fn error(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            command: command.into(),
            message: message.into(),
            data: serde_json::Value::Null,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// A routable command.
#[async_trait]
pub trait Command: Send + Sync {
    /// Unique command name.
    fn name(&self) -> &str;

    /// One-line usage shown by `help`.
    fn usage(&self) -> &str;

    /// Whether this command accepts the (trimmed) input line.
    fn can_handle(&self, input: &str) -> bool;

    async fn run(&self, input: &str) -> Result<CommandOutcome, CommandError>;
}

impl Registerable for dyn Command {
    fn registry_id(&self) -> &str {
        self.name()
    }
}
