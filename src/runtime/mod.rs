// Runtime module - runs a session on tokio
//
// This module contains:
// - SessionRuntime: Owns the task that ticks the engine and applies commands
// - SessionHandle: Cloneable command sender + event subscription for front-ends

pub mod driver;
pub mod handle;

pub use driver::SessionRuntime;
pub use handle::{SessionCommand, SessionHandle};
