//! Configuration and CLI argument handling

use std::path::PathBuf;

use clap::Parser;

use crate::{
    services::SleepMode, state::PluginOptions, tasks::ActionRunner,
    timer::settings::DEFAULT_MAX_TIMER_DELAY_MS,
};

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "channel-timer")]
#[command(about = "Switches the TV viewer to a channel and puts the system to sleep on a timer")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Skip the confirmation prompt before sleeping
    #[arg(long)]
    pub no_confirm: bool,

    /// Confirmation countdown in seconds (0 waits for an answer)
    #[arg(long, default_value = "10")]
    pub confirm_timeout: u32,

    /// Do not sleep while a recording is in progress
    #[arg(long)]
    pub respect_recording: bool,

    /// Allow enabling the timer with previously submitted settings
    #[arg(long)]
    pub no_settings_on_enable: bool,

    /// JSON file listing drivers, tuning spaces and channels
    #[arg(short, long)]
    pub catalog: Option<PathBuf>,

    /// Command used to switch channels, with {driver} {space} {channel}
    /// {network_id} {service_id} {name} placeholders
    #[arg(long)]
    pub switch_command: Option<String>,

    /// Power state to enter when the timer fires
    #[arg(long, value_enum, default_value_t = SleepMode::Suspend)]
    pub sleep_mode: SleepMode,

    /// Log channel switches and suspension instead of performing them
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn plugin_options(&self) -> PluginOptions {
        PluginOptions {
            confirm: !self.no_confirm,
            confirm_timeout_seconds: self.confirm_timeout,
            ignore_recording_status: !self.respect_recording,
            settings_on_enable: !self.no_settings_on_enable,
            max_timer_delay_ms: DEFAULT_MAX_TIMER_DELAY_MS,
        }
    }

    pub fn action_runner(&self) -> ActionRunner {
        ActionRunner {
            switch_command: self.switch_command.clone(),
            sleep_mode: self.sleep_mode,
            dry_run: self.dry_run,
        }
    }
}
