//! `console status` and `console logs [n]`.

use std::path::Path;
use std::sync::Arc;

use aether_protocols::{Command, CommandError, CommandOutcome};
use async_trait::async_trait;
use serde_json::{Value, json};

use crate::services::Services;

const DEFAULT_LOG_ENTRIES: usize = 50;
const MAX_LOG_ENTRIES: usize = 500;

pub struct ConsoleCommand {
    services: Arc<Services>,
}

impl ConsoleCommand {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }

    fn status(&self) -> Result<CommandOutcome, CommandError> {
        let config = &self.services.config;
        let state = load_json(&config.state_path())?;
        let dashboard = load_json(&config.dashboard_path())?;
        Ok(CommandOutcome::ok("console", "console status")
            .with_data(json!({ "state": state, "dashboard": dashboard })))
    }

    fn logs(&self, arg: Option<&str>) -> Result<CommandOutcome, CommandError> {
        let count = arg
            .and_then(|a| a.parse::<i64>().ok())
            .map(|n| n.clamp(1, MAX_LOG_ENTRIES as i64) as usize)
            .unwrap_or(DEFAULT_LOG_ENTRIES);

        let path = self.services.config.event_log_path();
        let Value::Array(entries) = load_json(&path)? else {
            return Err(CommandError::Failed(format!(
                "log file is not a list: {}",
                path.display()
            )));
        };
        let tail = entries[entries.len().saturating_sub(count)..].to_vec();
        Ok(
            CommandOutcome::ok("console", format!("{} log entries", tail.len()))
                .with_data(json!({ "entries": tail })),
        )
    }
}

fn load_json(path: &Path) -> Result<Value, CommandError> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            CommandError::NotFound(format!("file not found: {}", path.display()))
        }
        _ => CommandError::Failed(format!("unable to read {}: {e}", path.display())),
    })?;
    serde_json::from_str(&content)
        .map_err(|e| CommandError::Failed(format!("invalid json in {}: {e}", path.display())))
}

/// Subcommand text with the optional `console` prefix removed.
fn subcommand(input: &str) -> String {
    let lower = input.trim().to_lowercase();
    match lower.strip_prefix("console") {
        Some(rest) if rest.is_empty() || rest.starts_with(' ') => rest.trim().to_string(),
        _ => lower,
    }
}

#[async_trait]
impl Command for ConsoleCommand {
    fn name(&self) -> &str {
        "console"
    }

    fn usage(&self) -> &str {
        "console status | console logs [n]"
    }

    fn can_handle(&self, input: &str) -> bool {
        let lower = input.trim().to_lowercase();
        lower == "console" || lower.starts_with("console ") || lower == "logs" || lower.starts_with("logs ")
    }

    async fn run(&self, input: &str) -> Result<CommandOutcome, CommandError> {
        let sub = subcommand(input);
        let mut parts = sub.split_whitespace();
        match parts.next() {
            None => Err(CommandError::Usage(self.usage().to_string())),
            Some("status") => self.status(),
            Some("logs") => self.logs(parts.next()),
            Some(other) => Err(CommandError::Failed(format!(
                "unsupported console command: {other}"
            ))),
        }
    }
}
