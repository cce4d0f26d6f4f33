use super::*;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.data_dir, PathBuf::from("/tmp/aether"));
    assert_eq!(config.server.port, 8000);
    assert!(config.server.enabled);
    assert_eq!(config.runner.workers, 1);
    assert_eq!(config.runner.poll_interval_ms, 500);
    assert_eq!(config.enqueue.priority, 50);
    assert_eq!(config.orchestrator.tick_ms, 300);
}

#[test]
fn test_derived_paths() {
    let config = Config::default();
    assert_eq!(config.work_dir(), PathBuf::from("/tmp/aether/workspace"));
    assert_eq!(config.db_path(), PathBuf::from("/tmp/aether/aether_tasks.db"));
    assert_eq!(
        config.dashboard_path(),
        PathBuf::from("/tmp/aether/aether_dashboard.json")
    );
    assert_eq!(config.state_path(), PathBuf::from("/tmp/aether/aether_state.json"));
    assert_eq!(config.logs_dir(), PathBuf::from("/tmp/aether/logs"));
}

#[test]
fn test_explicit_work_dir_wins() {
    let mut config = Config::default();
    config.actions.work_dir = Some(PathBuf::from("/srv/sandbox"));
    assert_eq!(config.work_dir(), PathBuf::from("/srv/sandbox"));
}

#[test]
fn test_is_under_data_dir() {
    let config = Config::default();
    assert!(config.is_under_data_dir(Path::new("/tmp/aether/x.json")));
    assert!(!config.is_under_data_dir(Path::new("/tmp/aetherx/x.json")));
    assert!(!config.is_under_data_dir(Path::new("/etc/passwd")));
}

#[test]
fn test_actions_defaults() {
    let actions = ActionsConfig::default();
    assert_eq!(actions.allowed_shell_cmds, vec!["python", "pip"]);
    assert!(actions.allowed_http_domains.is_empty());
    assert_eq!(actions.output_tail_chars, 20_000);
    assert_eq!(actions.read_max_bytes, 200_000);
    assert!(actions.user_agent.starts_with("aether/"));
}

#[test]
fn test_gates_default_not_paused() {
    assert!(!GatesConfig::default().is_paused());
}

#[test]
fn test_gates_paused() {
    let gates = GatesConfig {
        safe_mode: true,
        ..Default::default()
    };
    assert!(gates.is_paused());

    let gates = GatesConfig {
        freeze: true,
        ..Default::default()
    };
    assert!(gates.is_paused());
}

#[test]
fn test_kill_switch_armed_is_not_paused() {
    let gates = GatesConfig {
        kill_switch: Some(KILL_SWITCH_ARMED.to_string()),
        ..Default::default()
    };
    assert!(!gates.is_paused());

    let gates = GatesConfig {
        kill_switch: Some("TRIGGERED".to_string()),
        ..Default::default()
    };
    assert!(gates.is_paused());
}

#[test]
fn test_config_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).unwrap();
    assert!(toml_str.contains("data_dir"));
    assert!(toml_str.contains("[runner]"));
}
