//! Ordered command dispatch.

use std::sync::Arc;

use aether_protocols::{BaseRegistry, Command, CommandOutcome, RegistryError};
use tracing::{debug, warn};

/// Static dispatch table of commands. The first command whose
/// `can_handle` accepts the input runs it.
pub struct CommandRouter {
    order: Vec<Arc<dyn Command>>,
    by_name: BaseRegistry<dyn Command>,
}

impl CommandRouter {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            by_name: BaseRegistry::new(),
        }
    }

    /// Append a command. Names must be unique.
    pub fn register(&mut self, command: Arc<dyn Command>) -> Result<(), RegistryError> {
        self.by_name.register(command.clone())?;
        self.order.push(command);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.by_name.get(name)
    }

    /// Command names in dispatch order.
    pub fn names(&self) -> Vec<String> {
        self.order.iter().map(|c| c.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Route one input line. `None` when no command claims it.
    pub async fn route(&self, input: &str) -> Option<CommandOutcome> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        let command = self.order.iter().find(|c| c.can_handle(input))?.clone();
        let name = command.name().to_string();
        debug!(command = %name, "Routing command");

        let line = input.to_string();
        let joined = tokio::spawn(async move { command.run(&line).await }).await;
        let outcome = match joined {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => CommandOutcome::error(&name, e.to_string()),
            Err(e) => {
                warn!(command = %name, error = %e, "Command panicked");
                CommandOutcome::error(&name, format!("command panicked: {e}"))
            }
        };
        Some(outcome)
    }
}

impl Default for CommandRouter {
    fn default() -> Self {
        Self::new()
    }
}
