//! `builder:` and `scientific:` acknowledgements.

use aether_protocols::{Command, CommandError, CommandOutcome};
use async_trait::async_trait;
use serde_json::json;

use super::after_colon;

/// Acknowledges a free-text request and returns a fixed list of next steps.
pub struct BriefCommand {
    name: &'static str,
    usage: &'static str,
    prefix: &'static str,
    message: &'static str,
    empty_input: &'static str,
    list_key: &'static str,
    steps: &'static [&'static str],
}

impl BriefCommand {
    pub fn builder() -> Self {
        Self {
            name: "builder",
            usage: "builder: <request>",
            prefix: "builder:",
            message: "Builder ready. Request received.",
            empty_input: "Empty builder request.",
            list_key: "next_steps",
            steps: &[
                "Clarify goal and scope",
                "Define stack and components",
                "Propose an initial plan",
            ],
        }
    }

    pub fn scientific() -> Self {
        Self {
            name: "scientific",
            usage: "scientific: <question>",
            prefix: "scientific:",
            message: "Scientific ready. Processing your question.",
            empty_input: "Empty scientific question.",
            list_key: "notes",
            steps: &[
                "Review the initial hypothesis",
                "Define variables and assumptions",
                "Propose a methodology",
            ],
        }
    }
}

#[async_trait]
impl Command for BriefCommand {
    fn name(&self) -> &str {
        self.name
    }

    fn usage(&self) -> &str {
        self.usage
    }

    fn can_handle(&self, input: &str) -> bool {
        input.trim().to_lowercase().starts_with(self.prefix)
    }

    async fn run(&self, input: &str) -> Result<CommandOutcome, CommandError> {
        let text = match after_colon(input) {
            "" => self.empty_input,
            text => text,
        };
        let mut data = json!({ "input": text });
        data[self.list_key] = json!(self.steps);
        Ok(CommandOutcome::ok(self.name, self.message).with_data(data))
    }
}
