//! Configuration validation.

use crate::schema::Config;

/// Interpreters that turn an argv allowlist into arbitrary code execution.
const SHELL_INTERPRETERS: &[&str] = &["sh", "bash", "zsh", "dash", "fish", "cmd", "powershell"];

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_data_dir(config, &mut result);
        Self::validate_runner(config, &mut result);
        Self::validate_enqueue(config, &mut result);
        Self::validate_actions(config, &mut result);

        result
    }

    fn validate_data_dir(config: &Config, result: &mut ValidationResult) {
        if !config.data_dir.is_absolute() {
            result.add_error(ValidationError::new(
                "data_dir",
                format!("data_dir must be absolute, got {:?}", config.data_dir),
            ));
        }
    }

    fn validate_runner(config: &Config, result: &mut ValidationResult) {
        if config.runner.workers == 0 {
            result.add_error(ValidationError::new(
                "runner.workers",
                "workers must be greater than 0",
            ));
        }

        if config.runner.poll_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "runner.poll_interval_ms",
                "poll_interval_ms must be greater than 0",
            ));
        }

        if config.runner.worker_prefix.trim().is_empty() {
            result.add_error(ValidationError::new(
                "runner.worker_prefix",
                "worker_prefix cannot be empty",
            ));
        }
    }

    fn validate_enqueue(config: &Config, result: &mut ValidationResult) {
        if config.enqueue.max_attempts == 0 {
            result.add_error(ValidationError::new(
                "enqueue.max_attempts",
                "max_attempts must be greater than 0",
            ));
        }
    }

    fn validate_actions(config: &Config, result: &mut ValidationResult) {
        if config.actions.allowed_http_domains.is_empty() {
            result.add_warning(ValidationWarning::new(
                "actions.allowed_http_domains",
                "HTTP allowlist is empty, every http.json task will be rejected",
            ));
        }

        for cmd in &config.actions.allowed_shell_cmds {
            if SHELL_INTERPRETERS.contains(&cmd.as_str()) {
                result.add_warning(ValidationWarning::new(
                    "actions.allowed_shell_cmds",
                    format!("'{}' is a shell interpreter and allows arbitrary commands", cmd),
                ));
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
