//! External command wrappers
//!
//! This module runs the commands that carry out the host actions the timer
//! requests: switching the viewer's channel and suspending the system.

pub mod channel;
pub mod system;

// Re-export main functions
pub use channel::*;
pub use system::*;
