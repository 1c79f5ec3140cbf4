//! Background tasks module
//!
//! This module contains the message loop that drives the plug-in session
//! alongside the HTTP server, and the host it runs against.

pub mod event_loop;
pub mod runtime_host;

// Re-export main types
pub use event_loop::{timer_loop_task, ActionRunner, Command};
pub use runtime_host::{HostAction, RuntimeHost};
