use aether_protocols::{Command, CommandError, CommandOutcome};
use async_trait::async_trait;
use serde_json::json;

/// Lists every registered command with its usage line.
pub struct HelpCommand {
    usages: Vec<(String, String)>,
}

impl HelpCommand {
    pub fn new(usages: Vec<(String, String)>) -> Self {
        Self { usages }
    }
}

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &str {
        "help"
    }

    fn usage(&self) -> &str {
        "help"
    }

    fn can_handle(&self, input: &str) -> bool {
        matches!(input.to_lowercase().as_str(), "help" | "?" | "ayuda")
    }

    async fn run(&self, _input: &str) -> Result<CommandOutcome, CommandError> {
        let text = self
            .usages
            .iter()
            .map(|(_, usage)| format!("  {usage}"))
            .collect::<Vec<_>>()
            .join("\n");
        let commands: Vec<_> = self
            .usages
            .iter()
            .map(|(name, usage)| json!({ "name": name, "usage": usage }))
            .collect();
        Ok(CommandOutcome::ok("help", format!("Available commands:\n{text}"))
            .with_data(json!({ "commands": commands })))
    }
}
