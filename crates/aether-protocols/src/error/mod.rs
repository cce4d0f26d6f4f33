//! Error types for the Aether protocol layer.

mod action;
mod command;
mod registry;

pub use action::*;
pub use command::*;
pub use registry::*;
