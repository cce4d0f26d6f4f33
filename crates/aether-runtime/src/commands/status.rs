use std::sync::Arc;

use aether_protocols::{Command, CommandError, CommandOutcome};
use async_trait::async_trait;

use crate::services::Services;

const RECENT: usize = 10;

pub struct StatusCommand {
    services: Arc<Services>,
}

impl StatusCommand {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Command for StatusCommand {
    fn name(&self) -> &str {
        "status"
    }

    fn usage(&self) -> &str {
        "status"
    }

    fn can_handle(&self, input: &str) -> bool {
        matches!(
            input.to_lowercase().as_str(),
            "status" | "aether status" | "estado" | "estado aether"
        )
    }

    async fn run(&self, _input: &str) -> Result<CommandOutcome, CommandError> {
        let report = self
            .services
            .status_report(RECENT)
            .await
            .map_err(|e| CommandError::Queue(e.to_string()))?;
        let pending = report["pending"].as_u64().unwrap_or(0);
        Ok(CommandOutcome::ok("status", format!("{pending} task(s) pending")).with_data(report))
    }
}
