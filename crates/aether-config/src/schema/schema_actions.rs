//! Action sandbox and gate flag configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Policy for the side-effecting action adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionsConfig {
    /// Sandbox base directory. Defaults to `<data_dir>/workspace`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,

    /// Executable names `shell.exec` may run.
    #[serde(default = "default_allowed_shell_cmds")]
    pub allowed_shell_cmds: Vec<String>,

    /// Hosts `http.json` may reach. Empty denies everything.
    #[serde(default)]
    pub allowed_http_domains: Vec<String>,

    #[serde(default = "default_output_tail_chars")]
    pub output_tail_chars: usize,

    #[serde(default = "default_read_max_bytes")]
    pub read_max_bytes: u64,

    /// Upper bound on the per-request HTTP timeout.
    #[serde(default = "default_http_timeout_cap_s")]
    pub http_timeout_cap_s: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            work_dir: None,
            allowed_shell_cmds: default_allowed_shell_cmds(),
            allowed_http_domains: Vec::new(),
            output_tail_chars: default_output_tail_chars(),
            read_max_bytes: default_read_max_bytes(),
            http_timeout_cap_s: default_http_timeout_cap_s(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_allowed_shell_cmds() -> Vec<String> {
    vec!["python".to_string(), "pip".to_string()]
}

fn default_output_tail_chars() -> usize {
    20_000
}

fn default_read_max_bytes() -> u64 {
    200_000
}

fn default_http_timeout_cap_s() -> u64 {
    60
}

fn default_user_agent() -> String {
    concat!("aether/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Sentinel kill-switch status meaning "not triggered".
pub const KILL_SWITCH_ARMED: &str = "ARMED";

/// External gate flags read by the heartbeat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatesConfig {
    #[serde(default)]
    pub safe_mode: bool,

    #[serde(default)]
    pub freeze: bool,

    /// Kill-switch status. Absent or `ARMED` means not triggered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kill_switch: Option<String>,
}

impl GatesConfig {
    /// Whether any gate forces the paused state.
    pub fn is_paused(&self) -> bool {
        self.safe_mode
            || self.freeze
            || self
                .kill_switch
                .as_deref()
                .is_some_and(|status| status != KILL_SWITCH_ARMED)
    }
}
