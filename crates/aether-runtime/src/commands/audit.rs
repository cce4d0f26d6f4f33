//! `audit:` read-only architecture report.

use std::sync::Arc;

use aether_protocols::{Command, CommandError, CommandOutcome};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::json;

use super::after_colon;
use crate::services::Services;

/// Describes the running system from its own configuration and state.
/// Never enqueues, writes or connects anywhere.
pub struct AuditCommand {
    services: Arc<Services>,
    commands: Vec<String>,
}

impl AuditCommand {
    pub fn new(services: Arc<Services>, commands: Vec<String>) -> Self {
        Self { services, commands }
    }

    fn report(&self, ts: &str) -> String {
        let config = &self.services.config;
        let gates = self.services.gates();
        let status = self
            .services
            .orchestrator_status()
            .map(|s| format!("{:?}", s.status).to_uppercase())
            .unwrap_or_else(|| "unknown".to_string());
        let mut task_types = self.services.handlers.task_types();
        task_types.sort();

        let mut lines = vec![
            "ARCHITECTURE AUDIT (read-only)".to_string(),
            format!("- ts: {ts}"),
            format!("- version: {}", env!("CARGO_PKG_VERSION")),
            format!("- status: {status}"),
            format!("- data_dir: {}", config.data_dir.display()),
            String::new(),
            "LAYERS".to_string(),
            "1) Runtime: durable task store, runner pool, orchestrator heartbeat.".to_string(),
            "2) Commands: statically registered, first match wins.".to_string(),
            "3) Safety gates: sandbox, shell and HTTP allowlists, safe mode, freeze, kill switch."
                .to_string(),
            String::new(),
            "COMMANDS".to_string(),
        ];
        lines.extend(self.commands.iter().map(|c| format!("- {c}")));
        lines.push(String::new());
        lines.push("TASK TYPES".to_string());
        lines.extend(task_types.iter().map(|t| format!("- {t}")));
        lines.push(String::new());
        lines.push("SAFETY SIGNALS".to_string());
        lines.push(format!("- safe_mode: {}", gates.safe_mode));
        lines.push(format!("- freeze: {}", gates.freeze));
        lines.push(format!(
            "- kill_switch: {}",
            gates.kill_switch.as_deref().unwrap_or("unset")
        ));
        lines.push(format!(
            "- allowed_shell_cmds: {:?}",
            config.actions.allowed_shell_cmds
        ));
        lines.push(format!(
            "- allowed_http_domains: {:?}",
            config.actions.allowed_http_domains
        ));
        lines.push(String::new());
        lines.push("FINDINGS".to_string());
        if config.actions.allowed_http_domains.is_empty() {
            lines.push("- HTTP actions are blocked (empty allowlist).".to_string());
        } else {
            lines.push("- HTTP actions reach the allowlisted hosts; review before exposing the API.".to_string());
        }
        if status == "unknown" {
            lines.push("- No heartbeat yet; the orchestrator is stopped or has not ticked.".to_string());
        }
        if gates.is_paused() {
            lines.push("- A gate flag is set; the heartbeat reports PAUSED.".to_string());
        }
        lines.join("\n")
    }
}

#[async_trait]
impl Command for AuditCommand {
    fn name(&self) -> &str {
        "audit"
    }

    fn usage(&self) -> &str {
        "audit: [topic]"
    }

    fn can_handle(&self, input: &str) -> bool {
        let lower = input.trim().to_lowercase();
        lower.starts_with("audit:") || lower.starts_with("auditar:")
    }

    async fn run(&self, input: &str) -> Result<CommandOutcome, CommandError> {
        let query = match after_colon(input).to_lowercase() {
            q if q.is_empty() => "architecture".to_string(),
            q => q,
        };
        let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let report = self.report(&ts);
        Ok(CommandOutcome::ok("audit", "Read-only report. Nothing was executed.").with_data(json!({
            "ts": ts,
            "mode": "audit_readonly",
            "query": query,
            "report": report,
        })))
    }
}
