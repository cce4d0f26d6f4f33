
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        let result = ConfigValidator::validate(&config);
        assert!(result.is_valid());
        // Default HTTP allowlist is deny-all.
        assert!(result
            .warnings
            .iter()
            .any(|w| w.path == "actions.allowed_http_domains"));
    }

    #[test]
    fn test_validate_zero_workers() {
        let mut config = Config::default();
        config.runner.workers = 0;

        let result = ConfigValidator::validate(&config);
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.path == "runner.workers"));
    }

    #[test]
    fn test_validate_zero_poll_interval() {
        let mut config = Config::default();
        config.runner.poll_interval_ms = 0;

        let result = ConfigValidator::validate(&config);
        assert!(result.errors.iter().any(|e| e.path == "runner.poll_interval_ms"));
    }

    #[test]
    fn test_validate_empty_worker_prefix() {
        let mut config = Config::default();
        config.runner.worker_prefix = "  ".to_string();

        let result = ConfigValidator::validate(&config);
        assert!(result.errors.iter().any(|e| e.path == "runner.worker_prefix"));
    }

    #[test]
    fn test_validate_zero_max_attempts() {
        let mut config = Config::default();
        config.enqueue.max_attempts = 0;

        let result = ConfigValidator::validate(&config);
        assert!(result.errors.iter().any(|e| e.path == "enqueue.max_attempts"));
    }

    #[test]
    fn test_validate_relative_data_dir() {
        let mut config = Config::default();
        config.data_dir = PathBuf::from("relative/dir");

        let result = ConfigValidator::validate(&config);
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.path == "data_dir"));
    }

    #[test]
    fn test_validate_shell_interpreter_warning() {
        let mut config = Config::default();
        config.actions.allowed_shell_cmds.push("bash".to_string());

        let result = ConfigValidator::validate(&config);
        assert!(result.is_valid());
        assert!(result
            .warnings
            .iter()
            .any(|w| w.path == "actions.allowed_shell_cmds" && w.message.contains("bash")));
    }

    #[test]
    fn test_validate_http_allowlist_set() {
        let mut config = Config::default();
        config.actions.allowed_http_domains = vec!["api.example.com".to_string()];

        let result = ConfigValidator::validate(&config);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_validate_multiple_errors() {
        let mut config = Config::default();
        config.runner.workers = 0;
        config.runner.poll_interval_ms = 0;
        config.enqueue.max_attempts = 0;

        let result = ConfigValidator::validate(&config);
        assert_eq!(result.errors.len(), 3);
    }

    #[test]
    fn test_validation_result_add_warning() {
        let mut result = ValidationResult::default();
        result.add_warning(ValidationWarning::new("test", "warning"));
        assert!(result.is_valid()); // Warnings don't make it invalid
        assert_eq!(result.warnings.len(), 1);
    }
