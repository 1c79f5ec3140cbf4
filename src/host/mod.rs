//! Host collaborator surface
//!
//! The timer never talks to the viewer application directly. Everything it
//! needs from the host (clock, EPG, recording status, channel switching,
//! power) goes through the traits in this module so that sessions can be
//! driven by the daemon runtime or by a scripted host in tests.

pub mod catalog;

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

pub use catalog::{ChannelCatalog, ServiceInfo};

/// Host-assigned identifier of one broadcast program within its service
pub type EventId = u16;

/// The program currently airing on the viewed service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramInfo {
    pub event_id: EventId,
    /// Start time in EPG local time (UTC+9)
    pub start_time: NaiveDateTime,
    /// Length in seconds, `0` when the end time is undecided
    pub duration_seconds: u32,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingStatus {
    NotRecording,
    Recording,
    Paused,
}

impl RecordingStatus {
    pub fn is_recording(&self) -> bool {
        !matches!(self, RecordingStatus::NotRecording)
    }
}

/// Channel the viewer switches to when the timer fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelTarget {
    pub driver: String,
    pub space: usize,
    pub channel: i32,
    pub network_id: u16,
    pub service_id: u16,
    pub name: String,
}

/// Timers a session may have scheduled on the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerId {
    /// Single shot fired when a duration elapses
    Sleep,
    /// Recurring poll for the date/time and program-end conditions
    Query,
    /// One-second countdown of the confirmation step
    Confirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Once(Duration),
    Every(Duration),
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("host operation failed: {0}")]
    Failed(String),
}

/// Queries and actions provided by the viewer application
pub trait Host {
    fn current_utc_time(&self) -> DateTime<Utc>;

    /// `None` when the EPG has nothing for the current service
    fn current_program_info(&self) -> Option<ProgramInfo>;

    /// `None` when the status cannot be determined
    fn recording_status(&self) -> Option<RecordingStatus>;

    fn select_channel(&mut self, target: &ChannelTarget) -> Result<(), HostError>;

    fn request_system_sleep(&mut self) -> Result<(), HostError>;

    /// Show or refresh the confirmation prompt. `None` means no timeout.
    fn show_confirmation(&mut self, remaining_seconds: Option<u32>);

    fn close_confirmation(&mut self);
}

/// Host timer service delivering ticks back to the session
pub trait TickScheduler {
    /// Replaces any schedule already registered under `id`
    fn schedule(&mut self, id: TimerId, schedule: Schedule);

    /// Removes the schedule for `id`. Does nothing if none is registered.
    fn cancel(&mut self, id: TimerId);
}

/// Enumeration of drivers, tuning spaces and channels offered for selection
pub trait ChannelDirectory {
    fn drivers(&self) -> Vec<String>;

    fn tuning_spaces(&self, driver: &str) -> Vec<String>;

    /// Enabled channels of one tuning space, in host order
    fn channels(&self, driver: &str, space: usize) -> Vec<ServiceInfo>;
}
