//! Pause predicate.
//!
//! The heartbeat pauses when an external gate is closed or when the locally
//! held state snapshot reports an equivalent condition.

use std::path::Path;

use aether_config::{GatesConfig, KILL_SWITCH_ARMED};
use serde_json::Value;
use tracing::warn;

/// Whether the local state snapshot asks for a pause.
///
/// Recognized keys: `status` in `{SAFE_MODE, FROZEN}`, `paused: true`,
/// `safe_mode.enabled`, `freeze.enabled` and a `kill_switch.status` other
/// than `ARMED`.
pub fn state_pauses(state: &Value) -> bool {
    if matches!(
        state.get("status").and_then(Value::as_str),
        Some("SAFE_MODE" | "FROZEN")
    ) {
        return true;
    }
    if state.get("paused").and_then(Value::as_bool) == Some(true) {
        return true;
    }
    if is_enabled(state.get("safe_mode")) || is_enabled(state.get("freeze")) {
        return true;
    }
    match state.get("kill_switch").and_then(|k| k.get("status")) {
        None | Some(Value::Null) => false,
        Some(status) => status.as_str() != Some(KILL_SWITCH_ARMED),
    }
}

fn is_enabled(section: Option<&Value>) -> bool {
    section
        .and_then(|s| s.get("enabled"))
        .is_some_and(truthy)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Combined pause decision over gate flags and local state.
pub fn should_pause(gates: &GatesConfig, state: &Value) -> bool {
    gates.is_paused() || state_pauses(state)
}

/// Read the state snapshot. A missing or unreadable file is an empty state.
pub fn load_state(path: &Path) -> Value {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Value::Object(Default::default());
    };
    match serde_json::from_str::<Value>(&content) {
        Ok(value) if value.is_object() => value,
        Ok(_) => Value::Object(Default::default()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable state file");
            Value::Object(Default::default())
        }
    }
}
