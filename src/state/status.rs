//! Status snapshot of a plug-in session

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::plugin::SleepOutcome;
use crate::{
    host::{ChannelTarget, EventId},
    timer::SleepCondition,
};

/// What the session is doing right now, as reported by `GET /status`
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub enabled: bool,
    pub armed: bool,
    pub condition: Option<SleepCondition>,
    pub target_channel: Option<ChannelTarget>,
    /// Seconds until the trigger, for conditions with a known deadline
    pub remaining_seconds: Option<u64>,
    pub tracked_event: Option<EventId>,
    pub confirmation_pending: bool,
    pub confirmation_remaining: Option<u32>,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
    pub last_outcome: Option<SleepOutcome>,
}
