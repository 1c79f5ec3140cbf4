//! Host implementation backing the daemon
//!
//! Viewer data (current program, recording status, channel catalog) is
//! pushed in over HTTP and cached here. Channel switches and suspend
//! requests are queued as [`HostAction`]s and carried out by the event loop
//! once the session call that produced them has returned.

use std::{collections::HashMap, time::Duration};

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::host::{
    ChannelCatalog, ChannelDirectory, ChannelTarget, Host, HostError, ProgramInfo, RecordingStatus,
    Schedule, ServiceInfo, TickScheduler, TimerId,
};

/// Side effects requested by the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostAction {
    SelectChannel(ChannelTarget),
    Suspend,
}

#[derive(Debug, Clone, Copy)]
struct ScheduledTick {
    due: Instant,
    period: Option<Duration>,
}

#[derive(Debug, Default)]
pub struct RuntimeHost {
    catalog: ChannelCatalog,
    program: Option<ProgramInfo>,
    recording: Option<RecordingStatus>,
    timers: HashMap<TimerId, ScheduledTick>,
    actions: Vec<HostAction>,
    /// Open prompt and its remaining seconds (`None` inside means no timeout)
    confirmation: Option<Option<u32>>,
}

impl RuntimeHost {
    pub fn new(catalog: ChannelCatalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    pub fn set_program(&mut self, program: Option<ProgramInfo>) {
        debug!("Current program updated: {:?}", program.as_ref().map(|p| p.event_id));
        self.program = program;
    }

    pub fn set_recording(&mut self, recording: Option<RecordingStatus>) {
        debug!("Recording status updated: {:?}", recording);
        self.recording = recording;
    }

    pub fn set_catalog(&mut self, catalog: ChannelCatalog) {
        debug!("Channel catalog replaced ({} drivers)", catalog.drivers.len());
        self.catalog = catalog;
    }

    pub fn confirmation(&self) -> Option<Option<u32>> {
        self.confirmation
    }

    /// Earliest scheduled tick
    pub fn next_due(&self) -> Option<(TimerId, Instant)> {
        self.timers
            .iter()
            .map(|(id, tick)| (*id, tick.due))
            .min_by_key(|(_, due)| *due)
    }

    /// Marks `id` as delivered: one-shot timers are dropped, recurring ones
    /// move to their next period
    pub fn fire(&mut self, id: TimerId) {
        let Some(tick) = self.timers.get_mut(&id) else {
            return;
        };
        match tick.period {
            Some(period) => tick.due = Instant::now() + period,
            None => {
                self.timers.remove(&id);
            }
        }
    }

    pub fn take_actions(&mut self) -> Vec<HostAction> {
        std::mem::take(&mut self.actions)
    }
}

impl Host for RuntimeHost {
    fn current_utc_time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn current_program_info(&self) -> Option<ProgramInfo> {
        self.program.clone()
    }

    fn recording_status(&self) -> Option<RecordingStatus> {
        self.recording
    }

    fn select_channel(&mut self, target: &ChannelTarget) -> Result<(), HostError> {
        self.actions.push(HostAction::SelectChannel(target.clone()));
        Ok(())
    }

    fn request_system_sleep(&mut self) -> Result<(), HostError> {
        self.actions.push(HostAction::Suspend);
        Ok(())
    }

    fn show_confirmation(&mut self, remaining_seconds: Option<u32>) {
        if self.confirmation.is_none() {
            info!("Waiting for confirmation to switch channel and sleep");
        }
        self.confirmation = Some(remaining_seconds);
    }

    fn close_confirmation(&mut self) {
        self.confirmation = None;
    }
}

impl TickScheduler for RuntimeHost {
    fn schedule(&mut self, id: TimerId, schedule: Schedule) {
        let now = Instant::now();
        let tick = match schedule {
            Schedule::Once(delay) => ScheduledTick {
                due: now + delay,
                period: None,
            },
            Schedule::Every(period) => ScheduledTick {
                due: now + period,
                period: Some(period),
            },
        };
        self.timers.insert(id, tick);
    }

    fn cancel(&mut self, id: TimerId) {
        self.timers.remove(&id);
    }
}

impl ChannelDirectory for RuntimeHost {
    fn drivers(&self) -> Vec<String> {
        self.catalog.drivers()
    }

    fn tuning_spaces(&self, driver: &str) -> Vec<String> {
        self.catalog.tuning_spaces(driver)
    }

    fn channels(&self, driver: &str, space: usize) -> Vec<ServiceInfo> {
        self.catalog.channels(driver, space)
    }
}
