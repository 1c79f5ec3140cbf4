//! Timer engine: arms host timers for the configured condition and decides
//! on each tick whether the sleep sequence should start.
//!
//! ```text
//!            begin()                    condition met
//!  Inert ─────────────► Armed ─────────────────────────► Trigger (caller disarms)
//!    ▲                    │
//!    └────── end() ───────┘
//! ```
//!
//! For the program-end condition the armed state has two phases: searching
//! for a program to wait out, and locked onto one event id. A change of the
//! airing event id while locked is the trigger.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{
    clock::{diff_millis, epg_to_utc, program_end_utc},
    settings::{SleepCondition, TimerConfiguration},
};
use crate::host::{EventId, Host, ProgramInfo, Schedule, TickScheduler, TimerId};

/// Poll interval for the date/time and program-end conditions
pub const QUERY_INTERVAL: Duration = Duration::from_secs(3);

/// Programs ending sooner than this are skipped when locking on
pub const PROGRAM_END_MARGIN_MS: i64 = 2 * 60 * 1000;

/// Result of evaluating one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to do this tick
    Idle,
    /// Started waiting for the end of this program
    Locked(ProgramInfo),
    /// The condition is met; the sleep sequence should start now
    Trigger,
}

#[derive(Debug, Clone)]
pub struct TimerEngine {
    config: TimerConfiguration,
    armed: bool,
    tracked_event: Option<EventId>,
    armed_at: Option<DateTime<Utc>>,
}

impl TimerEngine {
    pub fn new(config: TimerConfiguration) -> Self {
        Self {
            config,
            armed: false,
            tracked_event: None,
            armed_at: None,
        }
    }

    pub fn config(&self) -> &TimerConfiguration {
        &self.config
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Event id of the program being waited out, if locked
    pub fn tracked_event(&self) -> Option<EventId> {
        self.tracked_event
    }

    /// Arms the engine and registers the host timer for its condition
    pub fn begin<S>(&mut self, now: DateTime<Utc>, scheduler: &mut S)
    where
        S: TickScheduler + ?Sized,
    {
        self.end(scheduler);
        let grace = self.config.confirmation_grace_seconds;

        match &self.config.condition {
            SleepCondition::Duration { seconds } => {
                let delay = u64::from(seconds.saturating_sub(grace));
                info!("Sleeping in {} seconds", seconds);
                scheduler.schedule(TimerId::Sleep, Schedule::Once(Duration::from_secs(delay)));
            }
            SleepCondition::DateTime { target_utc } => {
                info!("Sleeping at {} (UTC)", target_utc.format("%Y/%m/%d %H:%M:%S"));
                scheduler.schedule(TimerId::Query, Schedule::Every(QUERY_INTERVAL));
            }
            SleepCondition::ProgramEnd => {
                info!("Sleeping when the current program ends");
                self.tracked_event = None;
                scheduler.schedule(TimerId::Query, Schedule::Every(QUERY_INTERVAL));
            }
        }

        self.armed = true;
        self.armed_at = Some(now);
    }

    /// Cancels every timer the engine may have registered
    pub fn end<S>(&mut self, scheduler: &mut S)
    where
        S: TickScheduler + ?Sized,
    {
        scheduler.cancel(TimerId::Sleep);
        scheduler.cancel(TimerId::Query);
        self.armed = false;
    }

    /// Evaluates the condition for a tick of `timer`
    pub fn on_tick<H>(&mut self, timer: TimerId, host: &H) -> TickOutcome
    where
        H: Host + ?Sized,
    {
        if !self.armed {
            debug!("Ignoring {:?} tick while disarmed", timer);
            return TickOutcome::Idle;
        }

        match (&self.config.condition, timer) {
            (SleepCondition::Duration { .. }, TimerId::Sleep) => TickOutcome::Trigger,
            (SleepCondition::DateTime { target_utc }, TimerId::Query) => {
                self.check_date_time(*target_utc, host.current_utc_time())
            }
            (SleepCondition::ProgramEnd, TimerId::Query) => match host.current_program_info() {
                Some(program) => self.check_program(program, host.current_utc_time()),
                None => {
                    debug!("No current program information");
                    TickOutcome::Idle
                }
            },
            _ => TickOutcome::Idle,
        }
    }

    fn grace_millis(&self) -> i64 {
        i64::from(self.config.confirmation_grace_seconds) * 1000
    }

    fn check_date_time(&self, target: DateTime<Utc>, now: DateTime<Utc>) -> TickOutcome {
        let delta = diff_millis(now, target);
        debug!("Date/time tick: {} ms relative to target", delta);
        if delta >= -self.grace_millis() {
            TickOutcome::Trigger
        } else {
            TickOutcome::Idle
        }
    }

    fn check_program(&mut self, program: ProgramInfo, now: DateTime<Utc>) -> TickOutcome {
        match self.tracked_event {
            None => {
                // Event id 0 is "no program"; keep searching until a real one airs
                if program.event_id == 0 {
                    debug!("Current program has no event id yet");
                    return TickOutcome::Idle;
                }
                let Some(start) = epg_to_utc(program.start_time) else {
                    debug!("Program {} has an unusable start time", program.event_id);
                    return TickOutcome::Idle;
                };

                let lock = if program.duration_seconds == 0 {
                    // Undecided end time: wait for whatever follows
                    true
                } else {
                    let Some(end) = program_end_utc(&program) else {
                        debug!("Program {} has an unusable end time", program.event_id);
                        return TickOutcome::Idle;
                    };
                    let adjusted = diff_millis(end, now) - self.grace_millis();
                    debug!(
                        "Program {} started {} UTC, ends in {} ms after grace",
                        program.event_id, start, adjusted
                    );
                    adjusted > PROGRAM_END_MARGIN_MS
                };

                if lock {
                    info!("Sleeping after this program ends: {}", program.name);
                    self.tracked_event = Some(program.event_id);
                    TickOutcome::Locked(program)
                } else {
                    debug!("Program {} ends within two minutes, waiting for the next one", program.event_id);
                    TickOutcome::Idle
                }
            }
            Some(tracked) if tracked != program.event_id => {
                info!("Program {} ended (now airing {})", tracked, program.event_id);
                TickOutcome::Trigger
            }
            Some(_) => TickOutcome::Idle,
        }
    }

    /// Instant the trigger is expected, when it can be known in advance
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        if !self.armed {
            return None;
        }
        let grace = chrono::Duration::seconds(i64::from(self.config.confirmation_grace_seconds));
        match &self.config.condition {
            SleepCondition::Duration { seconds } => self
                .armed_at
                .map(|at| at + (chrono::Duration::seconds(i64::from(*seconds)) - grace).max(chrono::Duration::zero())),
            SleepCondition::DateTime { target_utc } => Some(*target_utc - grace),
            SleepCondition::ProgramEnd => None,
        }
    }
}
