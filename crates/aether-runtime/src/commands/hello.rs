use aether_protocols::{Command, CommandError, CommandOutcome};
use async_trait::async_trait;
use serde_json::json;

pub struct HelloCommand;

#[async_trait]
impl Command for HelloCommand {
    fn name(&self) -> &str {
        "hello"
    }

    fn usage(&self) -> &str {
        "hello"
    }

    fn can_handle(&self, input: &str) -> bool {
        let lower = input.to_lowercase();
        ["hello", "hola", "saluda"].iter().any(|w| lower.contains(w))
    }

    async fn run(&self, input: &str) -> Result<CommandOutcome, CommandError> {
        Ok(CommandOutcome::ok("hello", "Hello, I am an example command.")
            .with_data(json!({ "input": input })))
    }
}
