//! Channel Timer - switches a TV viewer to a chosen channel and puts the
//! system to sleep once a duration elapses, a time is reached, or the
//! current program ends.
//!
//! The timer core (`timer`) talks to the viewer only through the traits in
//! `host`; `state` wraps it into a plug-in session and the remaining modules
//! run that session as a small HTTP-controlled daemon.

pub mod config;
pub mod host;
pub mod timer;
pub mod state;
pub mod api;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::{AppState, ChannelTimer, PluginOptions};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
