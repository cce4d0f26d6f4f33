//! # Aether Protocols
//!
//! Core seams shared by the queue, the action extensions and the runtime.
//!
//! - [`handler::TaskHandler`]: what the task runner dispatches to
//! - [`command::Command`]: chat-style commands served by the router
//! - [`error::ActionError`]: the typed failure taxonomy of side-effecting actions
//! - [`registry::BaseRegistry`]: id-keyed registry used for handlers and commands

pub mod command;
pub mod error;
pub mod handler;
pub mod registry;

pub use command::{Command, CommandOutcome};
pub use error::{ActionError, CommandError, RegistryError};
pub use handler::{HandlerContext, TaskHandler};
pub use registry::{BaseRegistry, Registerable};
