//! File action adapters and the task handlers wrapping them.

mod list_dir;
mod read_text;
mod write_text;

pub use list_dir::{DirEntry, DirListing, ListDirHandler, list_dir};
pub use read_text::{DEFAULT_READ_MAX_BYTES, ReadResult, ReadTextHandler, read_text};
pub use write_text::{WriteResult, WriteTextHandler, write_text};

use aether_protocols::ActionError;

fn parse_params<T: serde::de::DeserializeOwned>(
    payload: serde_json::Value,
) -> Result<T, ActionError> {
    serde_json::from_value(payload).map_err(|e| ActionError::InvalidPayload(e.to_string()))
}

fn to_value<T: serde::Serialize>(result: &T) -> Result<serde_json::Value, ActionError> {
    serde_json::to_value(result).map_err(|e| ActionError::ExecutionFailed(e.to_string()))
}
