//! Timer configuration and validation of submitted settings

use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::clock::{diff_millis, local_to_utc};
use crate::host::{ChannelDirectory, ChannelTarget};

/// Largest delay the host timer service accepts (`USER_TIMER_MAXIMUM`)
pub const DEFAULT_MAX_TIMER_DELAY_MS: u64 = 0x7FFF_FFFF;

/// Condition picked in the settings form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    Duration,
    DateTime,
    ProgramEnd,
}

/// What the armed timer waits for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SleepCondition {
    /// Seconds after arming
    Duration { seconds: u32 },
    /// Absolute instant, already normalized to UTC
    DateTime { target_utc: DateTime<Utc> },
    /// End of the program airing when the timer locks on
    ProgramEnd,
}

impl SleepCondition {
    pub fn kind(&self) -> ConditionKind {
        match self {
            SleepCondition::Duration { .. } => ConditionKind::Duration,
            SleepCondition::DateTime { .. } => ConditionKind::DateTime,
            SleepCondition::ProgramEnd => ConditionKind::ProgramEnd,
        }
    }
}

/// Accepted settings for one armed timer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerConfiguration {
    pub condition: SleepCondition,
    pub target_channel: ChannelTarget,
    /// Seconds before the trigger instant at which confirmation starts
    pub confirmation_grace_seconds: u32,
}

/// Raw values submitted from the settings form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsInput {
    pub condition: Option<ConditionKind>,
    #[serde(default)]
    pub duration_hours: u32,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default)]
    pub duration_seconds: u32,
    /// Wall-clock value of the date/time picker, local time
    #[serde(default)]
    pub date_time: Option<NaiveDateTime>,
    pub driver: Option<usize>,
    pub tuning_space: Option<usize>,
    pub channel: Option<usize>,
}

/// Host-dependent bounds applied during validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationLimits {
    pub confirmation_grace_seconds: u32,
    pub max_timer_delay_ms: u64,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            confirmation_grace_seconds: 0,
            max_timer_delay_ms: DEFAULT_MAX_TIMER_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Driver,
    TuningSpace,
    Channel,
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Driver => write!(f, "driver"),
            Selection::TuningSpace => write!(f, "tuning space"),
            Selection::Channel => write!(f, "channel"),
        }
    }
}

/// Reasons a settings submission is rejected. The text is shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("Select the condition that starts the timer.")]
    NoCondition,
    #[error("The duration is not valid.")]
    InvalidDuration,
    #[error("The duration must be at least {grace} seconds to leave room for confirmation.")]
    DurationTooShort { grace: u32 },
    #[error("The duration is too long.")]
    DurationTooLong,
    #[error("Specify a time.")]
    NoTimeSpecified,
    #[error("The specified time has already passed.")]
    TimePassed,
    #[error("Invalid {0} selection.")]
    InvalidSelection(Selection),
}

impl SettingsInput {
    /// Total duration entered in the hour/minute/second fields
    pub fn total_duration_seconds(&self) -> u64 {
        u64::from(self.duration_hours) * 3600
            + u64::from(self.duration_minutes) * 60
            + u64::from(self.duration_seconds)
    }

    /// Checks the submission and builds the configuration for the next armed timer.
    ///
    /// `tz` is the zone the date/time picker value is expressed in.
    pub fn validate<D, Tz>(
        &self,
        directory: &D,
        tz: &Tz,
        now: DateTime<Utc>,
        limits: &ValidationLimits,
    ) -> Result<TimerConfiguration, SettingsError>
    where
        D: ChannelDirectory + ?Sized,
        Tz: TimeZone,
    {
        let kind = self.condition.ok_or(SettingsError::NoCondition)?;
        let grace = limits.confirmation_grace_seconds;

        let condition = match kind {
            ConditionKind::Duration => {
                let total = self.total_duration_seconds();
                if total == 0 {
                    return Err(SettingsError::InvalidDuration);
                }
                if total < u64::from(grace) {
                    return Err(SettingsError::DurationTooShort { grace });
                }
                if total.saturating_mul(1000) > limits.max_timer_delay_ms {
                    return Err(SettingsError::DurationTooLong);
                }
                let seconds = u32::try_from(total).map_err(|_| SettingsError::DurationTooLong)?;
                SleepCondition::Duration { seconds }
            }
            ConditionKind::DateTime => {
                let local = self.date_time.as_ref().ok_or(SettingsError::NoTimeSpecified)?;
                let target_utc = local_to_utc(tz, local).ok_or(SettingsError::NoTimeSpecified)?;
                if diff_millis(target_utc, now) <= 0 {
                    return Err(SettingsError::TimePassed);
                }
                SleepCondition::DateTime { target_utc }
            }
            ConditionKind::ProgramEnd => SleepCondition::ProgramEnd,
        };

        let target_channel = self.resolve_channel(directory)?;

        Ok(TimerConfiguration {
            condition,
            target_channel,
            confirmation_grace_seconds: grace,
        })
    }

    fn resolve_channel<D>(&self, directory: &D) -> Result<ChannelTarget, SettingsError>
    where
        D: ChannelDirectory + ?Sized,
    {
        let driver = self
            .driver
            .and_then(|i| directory.drivers().into_iter().nth(i))
            .ok_or(SettingsError::InvalidSelection(Selection::Driver))?;

        let space = self
            .tuning_space
            .filter(|&i| i < directory.tuning_spaces(&driver).len())
            .ok_or(SettingsError::InvalidSelection(Selection::TuningSpace))?;

        let service = self
            .channel
            .and_then(|i| directory.channels(&driver, space).into_iter().nth(i))
            .ok_or(SettingsError::InvalidSelection(Selection::Channel))?;

        Ok(ChannelTarget {
            driver,
            space,
            channel: service.channel,
            network_id: service.network_id,
            service_id: service.service_id,
            name: service.name,
        })
    }
}
