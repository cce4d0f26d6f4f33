//! # Aether Config
//!
//! TOML configuration for the task queue, the action sandbox and the
//! orchestrator heartbeat.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::{ConfigLoader, DATA_DIR_ENV, DEFAULT_CONFIG_PATH};
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
