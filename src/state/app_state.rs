//! Shared application handle used by the HTTP surface

use std::time::Instant;

use tokio::sync::{mpsc, oneshot};

use crate::tasks::Command;

/// Handle to the timer loop plus server metadata
#[derive(Debug)]
pub struct AppState {
    /// Commands for the loop that owns the plug-in session
    pub commands: mpsc::Sender<Command>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
}

impl AppState {
    /// Create a new AppState around the loop's command sender
    pub fn new(commands: mpsc::Sender<Command>, port: u16, host: String) -> Self {
        Self {
            commands,
            start_time: Instant::now(),
            port,
            host,
        }
    }

    /// Send a command built around a reply channel and wait for the answer
    pub async fn request<T, F>(&self, build: F) -> Result<T, String>
    where
        F: FnOnce(oneshot::Sender<T>) -> Command,
    {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|e| format!("Timer loop is not running: {}", e))?;
        rx.await
            .map_err(|e| format!("Timer loop dropped the request: {}", e))
    }

    /// Send a command that has no reply
    pub async fn notify(&self, command: Command) -> Result<(), String> {
        self.commands
            .send(command)
            .await
            .map_err(|e| format!("Timer loop is not running: {}", e))
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
