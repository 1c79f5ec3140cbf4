//! State management module
//!
//! This module contains the plug-in session, its status snapshot and the
//! handle shared with the HTTP surface.

pub mod app_state;
pub mod plugin;
pub mod status;

// Re-export main types
pub use app_state::AppState;
pub use plugin::{ChannelTimer, PluginOptions, SessionError, SleepOutcome};
pub use status::SessionStatus;
