//! Built-in commands.

mod audit;
mod brief;
mod console;
mod hello;
mod help;
mod status;
mod task;

use std::sync::Arc;

use aether_protocols::{Command, RegistryError};

use crate::router::CommandRouter;
use crate::services::Services;

pub use audit::AuditCommand;
pub use brief::BriefCommand;
pub use console::ConsoleCommand;
pub use hello::HelloCommand;
pub use help::HelpCommand;
pub use status::StatusCommand;
pub use task::TaskCommand;

/// Router with every built-in command, `help` first.
///
/// `hello` matches on substrings, so it goes last.
pub fn builtin_router(services: Arc<Services>) -> Result<CommandRouter, RegistryError> {
    let mut commands: Vec<Arc<dyn Command>> = vec![
        Arc::new(StatusCommand::new(services.clone())),
        Arc::new(ConsoleCommand::new(services.clone())),
        Arc::new(TaskCommand::new(services.clone())),
        Arc::new(BriefCommand::builder()),
        Arc::new(BriefCommand::scientific()),
    ];

    let mut names: Vec<String> = vec!["help".to_string()];
    names.extend(commands.iter().map(|c| c.name().to_string()));
    names.extend(["audit".to_string(), "hello".to_string()]);
    commands.push(Arc::new(AuditCommand::new(services, names)));
    commands.push(Arc::new(HelloCommand));

    let mut usages = vec![("help".to_string(), "help".to_string())];
    usages.extend(
        commands
            .iter()
            .map(|c| (c.name().to_string(), c.usage().to_string())),
    );

    let mut router = CommandRouter::new();
    router.register(Arc::new(HelpCommand::new(usages)))?;
    for command in commands {
        router.register(command)?;
    }
    Ok(router)
}

/// Text after the first `:`, trimmed.
fn after_colon(input: &str) -> &str {
    input.split_once(':').map(|(_, rest)| rest.trim()).unwrap_or("")
}
