//! Built-in task handler registration.

use std::sync::Arc;

use aether_actions_files::Sandbox;
use aether_actions_http::{HttpActions, HttpPolicy};
use aether_actions_shell::ShellPolicy;
use aether_config::Config;
use aether_workqueue::HandlerRegistry;
use tracing::debug;

use crate::error::RuntimeError;

/// Register the files, shell and http handlers against one sandbox.
///
/// Returns the sandbox so callers can resolve paths inside it.
pub fn register_builtin_handlers(
    registry: &HandlerRegistry,
    config: &Config,
) -> Result<Arc<Sandbox>, RuntimeError> {
    let actions = &config.actions;
    let sandbox = Arc::new(Sandbox::new(config.work_dir())?);

    let shell_policy = Arc::new(ShellPolicy::new(
        actions.allowed_shell_cmds.clone(),
        actions.output_tail_chars,
    ));
    let http = Arc::new(HttpActions::new(
        HttpPolicy::new(
            actions.allowed_http_domains.clone(),
            actions.http_timeout_cap_s,
        ),
        &actions.user_agent,
    )?);

    let handlers = aether_actions_files::handlers(sandbox.clone(), actions.read_max_bytes)
        .into_iter()
        .chain(aether_actions_shell::handlers(shell_policy, sandbox.clone()))
        .chain(aether_actions_http::handlers(http));

    for handler in handlers {
        debug!(task_type = handler.task_type(), "Registering handler");
        registry.register(handler)?;
    }

    Ok(sandbox)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_registers_all_builtin_types() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let registry = HandlerRegistry::new();

        let sandbox = register_builtin_handlers(&registry, &config).unwrap();

        let mut types = registry.task_types();
        types.sort();
        assert_eq!(
            types,
            vec![
                "files.list_dir",
                "files.read_text",
                "files.write_text",
                "http.json",
                "shell.exec",
            ]
        );
        assert!(sandbox.base().ends_with("workspace"));
        assert!(dir.path().join("workspace").is_dir());
    }

    #[test]
    fn test_second_registration_is_rejected() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let registry = HandlerRegistry::new();

        register_builtin_handlers(&registry, &config).unwrap();
        assert!(register_builtin_handlers(&registry, &config).is_err());
    }
}
