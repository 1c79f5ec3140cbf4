//! Plug-in session: owns the configuration, the engine and a pending
//! confirmation, and reacts to host notifications and timer ticks.

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::SessionStatus;
use crate::{
    host::{ChannelDirectory, ChannelTarget, Host, Schedule, TickScheduler, TimerId},
    timer::{
        confirm::CONFIRM_TICK, settings::DEFAULT_MAX_TIMER_DELAY_MS, ConfirmationGate, Decision,
        GateStatus, SettingsError, SettingsInput, TickOutcome, TimerConfiguration, TimerEngine,
        ValidationLimits,
    },
};

/// Behaviour switches that outlive a single armed timer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginOptions {
    /// Ask before switching and sleeping
    pub confirm: bool,
    /// Countdown of the confirmation prompt, 0 waits for an answer
    pub confirm_timeout_seconds: u32,
    /// Sleep even while a recording is running
    pub ignore_recording_status: bool,
    /// Enabling the plug-in requires submitting settings
    pub settings_on_enable: bool,
    pub max_timer_delay_ms: u64,
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            confirm: true,
            confirm_timeout_seconds: 10,
            ignore_recording_status: true,
            settings_on_enable: true,
            max_timer_delay_ms: DEFAULT_MAX_TIMER_DELAY_MS,
        }
    }
}

impl PluginOptions {
    /// Grace window reserved ahead of the trigger for the confirmation prompt
    pub fn confirmation_grace_seconds(&self) -> u32 {
        if self.confirm {
            self.confirm_timeout_seconds
        } else {
            0
        }
    }

    pub fn limits(&self) -> ValidationLimits {
        ValidationLimits {
            confirmation_grace_seconds: self.confirmation_grace_seconds(),
            max_timer_delay_ms: self.max_timer_delay_ms,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("Settings must be submitted to enable the timer.")]
    SettingsRequired,
    #[error("The timer has not been configured.")]
    NotConfigured,
    #[error("No confirmation is pending.")]
    NoPendingConfirmation,
}

/// How a sleep sequence ended, or that it is waiting for confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepOutcome {
    AwaitingConfirmation,
    Completed,
    CancelledByUser,
    RecordingStatusUnavailable,
    Recording,
}

#[derive(Debug)]
struct PendingSleep {
    gate: ConfirmationGate,
    target: ChannelTarget,
}

/// One plug-in instance. Created once, enabled and disabled by the host.
pub struct ChannelTimer<H> {
    host: H,
    options: PluginOptions,
    config: Option<TimerConfiguration>,
    engine: Option<TimerEngine>,
    enabled: bool,
    pending: Option<PendingSleep>,
    last_action: Option<(String, DateTime<Utc>)>,
    last_outcome: Option<SleepOutcome>,
}

impl<H> ChannelTimer<H>
where
    H: Host + TickScheduler + ChannelDirectory,
{
    pub fn new(host: H, options: PluginOptions) -> Self {
        Self {
            host,
            options,
            config: None,
            engine: None,
            enabled: false,
            pending: None,
            last_action: None,
            last_outcome: None,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn options(&self) -> &PluginOptions {
        &self.options
    }

    pub fn config(&self) -> Option<&TimerConfiguration> {
        self.config.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_confirming(&self) -> bool {
        self.pending.is_some()
    }

    /// Handles the host's enable/disable notification, local time zone
    pub fn set_enabled(&mut self, enable: bool, settings: Option<SettingsInput>) -> Result<(), SessionError> {
        self.set_enabled_in(enable, settings, &Local)
    }

    pub fn set_enabled_in<Tz: TimeZone>(
        &mut self,
        enable: bool,
        settings: Option<SettingsInput>,
        tz: &Tz,
    ) -> Result<(), SessionError> {
        if !enable {
            self.disable();
            return Ok(());
        }

        match settings {
            Some(input) => self.commit_settings(&input, tz)?,
            None if self.options.settings_on_enable => return Err(SessionError::SettingsRequired),
            None => {}
        }
        if self.config.is_none() {
            return Err(SessionError::NotConfigured);
        }

        if let Some(pending) = self.pending.take() {
            warn!("Discarding pending confirmation for {}", pending.target.name);
            self.close_confirmation();
        }

        self.enabled = true;
        self.record("enable");
        self.arm();
        Ok(())
    }

    /// Replaces the configuration, local time zone
    pub fn apply_settings(&mut self, input: &SettingsInput) -> Result<(), SessionError> {
        self.apply_settings_in(input, &Local)
    }

    /// Replaces the configuration and re-arms when enabled
    pub fn apply_settings_in<Tz: TimeZone>(&mut self, input: &SettingsInput, tz: &Tz) -> Result<(), SessionError> {
        self.commit_settings(input, tz)?;
        self.record("settings");
        if self.enabled {
            self.arm();
        }
        Ok(())
    }

    fn commit_settings<Tz: TimeZone>(&mut self, input: &SettingsInput, tz: &Tz) -> Result<(), SessionError> {
        let now = self.host.current_utc_time();
        match input.validate(&self.host, tz, now, &self.options.limits()) {
            Ok(config) => {
                info!(
                    "Settings accepted: {:?}, switching to {}",
                    config.condition.kind(),
                    config.target_channel.name
                );
                self.config = Some(config);
                Ok(())
            }
            Err(e) => {
                warn!("Settings rejected: {}", e);
                Err(e.into())
            }
        }
    }

    fn disable(&mut self) {
        if self.pending.take().is_some() {
            info!("Pending sleep cancelled because the timer was disabled");
            self.close_confirmation();
            self.last_outcome = Some(SleepOutcome::CancelledByUser);
        }
        self.enabled = false;
        self.disarm();
        self.record("disable");
    }

    fn arm(&mut self) {
        self.disarm();
        let Some(config) = self.config.clone() else {
            return;
        };
        let now = self.host.current_utc_time();
        let mut engine = TimerEngine::new(config);
        engine.begin(now, &mut self.host);
        self.engine = Some(engine);
    }

    fn disarm(&mut self) {
        match self.engine.as_mut() {
            Some(engine) => engine.end(&mut self.host),
            None => {
                self.host.cancel(TimerId::Sleep);
                self.host.cancel(TimerId::Query);
            }
        }
        self.engine = None;
    }

    /// Delivers a host timer tick
    pub fn on_timer(&mut self, timer: TimerId) -> Option<SleepOutcome> {
        if timer == TimerId::Confirm {
            return self.on_confirm_tick();
        }

        let outcome = match self.engine.as_mut() {
            Some(engine) => engine.on_tick(timer, &self.host),
            None => {
                debug!("Tick {:?} with no engine", timer);
                TickOutcome::Idle
            }
        };

        match outcome {
            TickOutcome::Idle => None,
            TickOutcome::Locked(program) => {
                self.record(&format!("waiting for end of {}", program.name));
                None
            }
            TickOutcome::Trigger => Some(self.begin_sleep()),
        }
    }

    fn begin_sleep(&mut self) -> SleepOutcome {
        info!("Starting sleep sequence");

        // One shot: nothing may fire again while the sequence runs
        let target = self.engine.as_ref().map(|e| e.config().target_channel.clone());
        self.enabled = false;
        self.disarm();
        self.record("trigger");

        let Some(target) = target else {
            return self.finish(SleepOutcome::CancelledByUser);
        };

        if self.options.confirm {
            let gate = ConfirmationGate::new(self.options.confirm_timeout_seconds);
            if gate.remaining().is_some() {
                self.host.schedule(TimerId::Confirm, Schedule::Every(CONFIRM_TICK));
            }
            self.host.show_confirmation(gate.remaining());
            self.pending = Some(PendingSleep { gate, target });
            self.last_outcome = Some(SleepOutcome::AwaitingConfirmation);
            return SleepOutcome::AwaitingConfirmation;
        }

        self.execute(&target)
    }

    fn on_confirm_tick(&mut self) -> Option<SleepOutcome> {
        let status = self.pending.as_mut()?.gate.tick();
        match status {
            GateStatus::Pending(remaining) => {
                self.host.show_confirmation(remaining);
                None
            }
            GateStatus::Decided(decision) => Some(self.resolve(decision)),
        }
    }

    /// Answers the confirmation prompt
    pub fn confirm(&mut self, decision: Decision) -> Result<SleepOutcome, SessionError> {
        let pending = self.pending.as_mut().ok_or(SessionError::NoPendingConfirmation)?;
        match pending.gate.decide(decision) {
            GateStatus::Decided(decision) => Ok(self.resolve(decision)),
            GateStatus::Pending(_) => Ok(SleepOutcome::AwaitingConfirmation),
        }
    }

    fn resolve(&mut self, decision: Decision) -> SleepOutcome {
        let Some(pending) = self.pending.take() else {
            return SleepOutcome::CancelledByUser;
        };
        self.close_confirmation();

        match decision {
            Decision::Accept => self.execute(&pending.target),
            Decision::Cancel => {
                info!("Sleep cancelled by user");
                self.finish(SleepOutcome::CancelledByUser)
            }
        }
    }

    fn close_confirmation(&mut self) {
        self.host.cancel(TimerId::Confirm);
        self.host.close_confirmation();
    }

    fn execute(&mut self, target: &ChannelTarget) -> SleepOutcome {
        if !self.options.ignore_recording_status {
            match self.host.recording_status() {
                None => {
                    warn!("Sleep cancelled: recording status is unavailable");
                    return self.finish(SleepOutcome::RecordingStatusUnavailable);
                }
                Some(status) if status.is_recording() => {
                    info!("Sleep cancelled: recording in progress");
                    return self.finish(SleepOutcome::Recording);
                }
                Some(_) => {}
            }
        }

        info!("Switching to {} ({} {})", target.name, target.network_id, target.service_id);
        if let Err(e) = self.host.select_channel(target) {
            error!("Failed to switch channel: {}", e);
        }

        if let Err(e) = self.host.request_system_sleep() {
            error!("Failed to request system sleep: {}", e);
        }

        self.finish(SleepOutcome::Completed)
    }

    fn finish(&mut self, outcome: SleepOutcome) -> SleepOutcome {
        self.last_outcome = Some(outcome);
        outcome
    }

    fn record(&mut self, action: &str) {
        self.last_action = Some((action.to_string(), self.host.current_utc_time()));
    }

    pub fn status(&self) -> SessionStatus {
        let now = self.host.current_utc_time();
        let (last_action, last_action_time) = match &self.last_action {
            Some((action, at)) => (Some(action.clone()), Some(*at)),
            None => (None, None),
        };

        SessionStatus {
            enabled: self.enabled,
            armed: self.engine.as_ref().is_some_and(|e| e.is_armed()),
            condition: self.config.as_ref().map(|c| c.condition.clone()),
            target_channel: self.config.as_ref().map(|c| c.target_channel.clone()),
            remaining_seconds: self
                .engine
                .as_ref()
                .and_then(|e| e.deadline())
                .map(|deadline| crate::timer::clock::seconds_until(now, deadline)),
            tracked_event: self.engine.as_ref().and_then(|e| e.tracked_event()),
            confirmation_pending: self.pending.is_some(),
            confirmation_remaining: self.pending.as_ref().and_then(|p| p.gate.remaining()),
            last_action,
            last_action_time,
            last_outcome: self.last_outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{
        catalog::{ChannelCatalog, DriverEntry, ServiceInfo, TuningSpaceEntry},
        HostError, ProgramInfo, RecordingStatus,
    };
    use crate::timer::{ConditionKind, SleepCondition};
    use chrono::{Duration, FixedOffset, NaiveDate};
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        SelectChannel(u16),
        Sleep,
        ShowConfirmation(Option<u32>),
        CloseConfirmation,
    }

    struct ScriptedHost {
        now: DateTime<Utc>,
        program: Option<ProgramInfo>,
        recording: Option<RecordingStatus>,
        switch_fails: bool,
        catalog: ChannelCatalog,
        timers: HashMap<TimerId, Schedule>,
        calls: Vec<Call>,
    }

    impl ScriptedHost {
        fn new() -> Self {
            Self {
                now: NaiveDate::from_ymd_opt(2024, 6, 1)
                    .unwrap()
                    .and_hms_opt(12, 0, 0)
                    .unwrap()
                    .and_utc(),
                program: None,
                recording: Some(RecordingStatus::NotRecording),
                switch_fails: false,
                catalog: ChannelCatalog {
                    drivers: vec![DriverEntry {
                        name: "BonDriver_PT-T.dll".to_string(),
                        tuning_spaces: vec![TuningSpaceEntry {
                            name: "UHF".to_string(),
                            channels: vec![ServiceInfo {
                                name: "NHK".to_string(),
                                network_id: 32736,
                                service_id: 1024,
                                channel: 27,
                                disabled: false,
                            }],
                        }],
                    }],
                },
                timers: HashMap::new(),
                calls: Vec::new(),
            }
        }
    }

    impl Host for ScriptedHost {
        fn current_utc_time(&self) -> DateTime<Utc> {
            self.now
        }

        fn current_program_info(&self) -> Option<ProgramInfo> {
            self.program.clone()
        }

        fn recording_status(&self) -> Option<RecordingStatus> {
            self.recording
        }

        fn select_channel(&mut self, target: &ChannelTarget) -> Result<(), HostError> {
            self.calls.push(Call::SelectChannel(target.service_id));
            if self.switch_fails {
                return Err(HostError::Failed("tuner busy".to_string()));
            }
            Ok(())
        }

        fn request_system_sleep(&mut self) -> Result<(), HostError> {
            self.calls.push(Call::Sleep);
            Ok(())
        }

        fn show_confirmation(&mut self, remaining_seconds: Option<u32>) {
            self.calls.push(Call::ShowConfirmation(remaining_seconds));
        }

        fn close_confirmation(&mut self) {
            self.calls.push(Call::CloseConfirmation);
        }
    }

    impl TickScheduler for ScriptedHost {
        fn schedule(&mut self, id: TimerId, schedule: Schedule) {
            self.timers.insert(id, schedule);
        }

        fn cancel(&mut self, id: TimerId) {
            self.timers.remove(&id);
        }
    }

    impl ChannelDirectory for ScriptedHost {
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

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn duration_settings(seconds: u32) -> SettingsInput {
        SettingsInput {
            condition: Some(ConditionKind::Duration),
            duration_seconds: seconds,
            driver: Some(0),
            tuning_space: Some(0),
            channel: Some(0),
            ..SettingsInput::default()
        }
    }

    fn session(options: PluginOptions) -> ChannelTimer<ScriptedHost> {
        ChannelTimer::new(ScriptedHost::new(), options)
    }

    fn no_confirm() -> PluginOptions {
        PluginOptions {
            confirm: false,
            ..PluginOptions::default()
        }
    }

    #[test]
    fn enable_requires_settings_by_default() {
        let mut timer = session(PluginOptions::default());
        assert!(matches!(
            timer.set_enabled_in(true, None, &jst()),
            Err(SessionError::SettingsRequired)
        ));
        assert!(!timer.is_enabled());
    }

    #[test]
    fn enable_without_any_configuration_fails() {
        let mut timer = session(PluginOptions {
            settings_on_enable: false,
            ..PluginOptions::default()
        });
        assert!(matches!(
            timer.set_enabled_in(true, None, &jst()),
            Err(SessionError::NotConfigured)
        ));
    }

    #[test]
    fn rejected_settings_keep_previous_configuration() {
        let mut timer = session(PluginOptions::default());
        timer.apply_settings_in(&duration_settings(60), &jst()).unwrap();
        let before = timer.config().cloned();

        let err = timer.apply_settings_in(&duration_settings(5), &jst()).unwrap_err();
        assert!(matches!(err, SessionError::Settings(SettingsError::DurationTooShort { grace: 10 })));
        assert_eq!(timer.config().cloned(), before);
    }

    #[test]
    fn duration_timer_is_scheduled_ahead_of_grace() {
        let mut timer = session(PluginOptions::default());
        timer.set_enabled_in(true, Some(duration_settings(30)), &jst()).unwrap();

        assert!(timer.is_enabled());
        assert_eq!(
            timer.host().timers.get(&TimerId::Sleep),
            Some(&Schedule::Once(std::time::Duration::from_secs(20)))
        );
        assert_eq!(timer.status().remaining_seconds, Some(20));
    }

    #[test]
    fn grace_is_zero_without_confirmation() {
        let mut timer = session(no_confirm());
        timer.set_enabled_in(true, Some(duration_settings(3)), &jst()).unwrap();
        assert_eq!(timer.config().unwrap().confirmation_grace_seconds, 0);
        assert_eq!(
            timer.host().timers.get(&TimerId::Sleep),
            Some(&Schedule::Once(std::time::Duration::from_secs(3)))
        );
    }

    #[test]
    fn trigger_without_confirmation_switches_then_sleeps() {
        let mut timer = session(no_confirm());
        timer.set_enabled_in(true, Some(duration_settings(30)), &jst()).unwrap();

        assert_eq!(timer.on_timer(TimerId::Sleep), Some(SleepOutcome::Completed));
        assert_eq!(timer.host().calls, vec![Call::SelectChannel(1024), Call::Sleep]);
        assert!(!timer.is_enabled());
        assert!(timer.host().timers.is_empty());
    }

    #[test]
    fn trigger_fires_only_once() {
        let mut timer = session(no_confirm());
        timer.set_enabled_in(true, Some(duration_settings(30)), &jst()).unwrap();

        timer.on_timer(TimerId::Sleep);
        assert_eq!(timer.on_timer(TimerId::Sleep), None);
        assert_eq!(timer.on_timer(TimerId::Query), None);
        assert_eq!(timer.host().calls.len(), 2);
    }

    #[test]
    fn confirmation_times_out_into_accept() {
        let mut timer = session(PluginOptions::default());
        timer.set_enabled_in(true, Some(duration_settings(30)), &jst()).unwrap();

        assert_eq!(timer.on_timer(TimerId::Sleep), Some(SleepOutcome::AwaitingConfirmation));
        assert!(timer.host().timers.contains_key(&TimerId::Confirm));
        assert!(!timer.host().timers.contains_key(&TimerId::Sleep));

        for _ in 0..9 {
            assert_eq!(timer.on_timer(TimerId::Confirm), None);
        }
        assert_eq!(timer.status().confirmation_remaining, Some(1));
        assert_eq!(timer.on_timer(TimerId::Confirm), Some(SleepOutcome::Completed));

        let calls = &timer.host().calls;
        assert_eq!(calls.first(), Some(&Call::ShowConfirmation(Some(10))));
        assert_eq!(calls[9], Call::ShowConfirmation(Some(1)));
        assert_eq!(&calls[10..], &[Call::CloseConfirmation, Call::SelectChannel(1024), Call::Sleep]);
        assert!(timer.host().timers.is_empty());
    }

    #[test]
    fn user_cancel_aborts_without_rearming() {
        let mut timer = session(PluginOptions::default());
        timer.set_enabled_in(true, Some(duration_settings(30)), &jst()).unwrap();
        timer.on_timer(TimerId::Sleep);

        assert_eq!(timer.confirm(Decision::Cancel).unwrap(), SleepOutcome::CancelledByUser);
        assert!(!timer.is_enabled());
        assert!(timer.host().timers.is_empty());
        assert!(!timer.host().calls.contains(&Call::Sleep));
        assert_eq!(timer.status().last_outcome, Some(SleepOutcome::CancelledByUser));
    }

    #[test]
    fn user_accept_proceeds_immediately() {
        let mut timer = session(PluginOptions::default());
        timer.set_enabled_in(true, Some(duration_settings(30)), &jst()).unwrap();
        timer.on_timer(TimerId::Sleep);
        timer.on_timer(TimerId::Confirm);

        assert_eq!(timer.confirm(Decision::Accept).unwrap(), SleepOutcome::Completed);
        assert!(timer.host().calls.ends_with(&[Call::SelectChannel(1024), Call::Sleep]));
    }

    #[test]
    fn confirm_without_pending_prompt_is_an_error() {
        let mut timer = session(PluginOptions::default());
        assert!(matches!(
            timer.confirm(Decision::Accept),
            Err(SessionError::NoPendingConfirmation)
        ));
    }

    #[test]
    fn recording_in_progress_aborts_before_switch() {
        let mut timer = session(PluginOptions {
            ignore_recording_status: false,
            ..PluginOptions::default()
        });
        timer.host_mut().recording = Some(RecordingStatus::Recording);
        timer.set_enabled_in(true, Some(duration_settings(30)), &jst()).unwrap();
        timer.on_timer(TimerId::Sleep);

        assert_eq!(timer.confirm(Decision::Accept).unwrap(), SleepOutcome::Recording);
        assert!(!timer.host().calls.iter().any(|c| matches!(c, Call::SelectChannel(_) | Call::Sleep)));
    }

    #[test]
    fn paused_recording_counts_as_recording() {
        let mut timer = session(PluginOptions {
            ignore_recording_status: false,
            ..no_confirm()
        });
        timer.host_mut().recording = Some(RecordingStatus::Paused);
        timer.set_enabled_in(true, Some(duration_settings(30)), &jst()).unwrap();

        assert_eq!(timer.on_timer(TimerId::Sleep), Some(SleepOutcome::Recording));
        assert!(!timer.host().calls.iter().any(|c| matches!(c, Call::SelectChannel(_) | Call::Sleep)));
        assert!(!timer.is_enabled());
    }

    #[test]
    fn unknown_recording_status_aborts() {
        let mut timer = session(PluginOptions {
            ignore_recording_status: false,
            ..no_confirm()
        });
        timer.host_mut().recording = None;
        timer.set_enabled_in(true, Some(duration_settings(30)), &jst()).unwrap();

        assert_eq!(
            timer.on_timer(TimerId::Sleep),
            Some(SleepOutcome::RecordingStatusUnavailable)
        );
        assert!(timer.host().calls.is_empty());
    }

    #[test]
    fn recording_is_ignored_by_default() {
        let mut timer = session(no_confirm());
        timer.host_mut().recording = Some(RecordingStatus::Recording);
        timer.set_enabled_in(true, Some(duration_settings(30)), &jst()).unwrap();
        assert_eq!(timer.on_timer(TimerId::Sleep), Some(SleepOutcome::Completed));
    }

    #[test]
    fn channel_switch_failure_still_requests_sleep() {
        let mut timer = session(no_confirm());
        timer.host_mut().switch_fails = true;
        timer.set_enabled_in(true, Some(duration_settings(30)), &jst()).unwrap();

        assert_eq!(timer.on_timer(TimerId::Sleep), Some(SleepOutcome::Completed));
        assert_eq!(timer.host().calls, vec![Call::SelectChannel(1024), Call::Sleep]);
    }

    #[test]
    fn disable_cancels_scheduled_ticks() {
        let mut timer = session(PluginOptions::default());
        timer.set_enabled_in(true, Some(duration_settings(30)), &jst()).unwrap();
        timer.set_enabled_in(false, None, &jst()).unwrap();

        assert!(!timer.is_enabled());
        assert!(timer.host().timers.is_empty());
        assert!(!timer.status().armed);
        assert_eq!(timer.on_timer(TimerId::Sleep), None);
    }

    #[test]
    fn disable_during_confirmation_cancels_it() {
        let mut timer = session(PluginOptions::default());
        timer.set_enabled_in(true, Some(duration_settings(30)), &jst()).unwrap();
        timer.on_timer(TimerId::Sleep);
        timer.set_enabled_in(false, None, &jst()).unwrap();

        assert!(!timer.is_confirming());
        assert_eq!(timer.host().calls.last(), Some(&Call::CloseConfirmation));
        assert_eq!(timer.on_timer(TimerId::Confirm), None);
    }

    #[test]
    fn settings_while_enabled_rearm_with_new_condition() {
        let mut timer = session(no_confirm());
        timer.set_enabled_in(true, Some(duration_settings(30)), &jst()).unwrap();

        let program_end = SettingsInput {
            condition: Some(ConditionKind::ProgramEnd),
            ..duration_settings(0)
        };
        timer.apply_settings_in(&program_end, &jst()).unwrap();

        assert_eq!(timer.config().unwrap().condition, SleepCondition::ProgramEnd);
        assert!(!timer.host().timers.contains_key(&TimerId::Sleep));
        assert!(timer.host().timers.contains_key(&TimerId::Query));
    }

    #[test]
    fn program_end_locks_then_triggers_on_change() {
        let mut timer = session(no_confirm());
        let now = timer.host().now;
        let start_epg = now.naive_utc() + Duration::hours(9) - Duration::minutes(10);
        timer.host_mut().program = Some(ProgramInfo {
            event_id: 100,
            start_time: start_epg,
            duration_seconds: 30 * 60,
            name: "Drama".to_string(),
        });

        let settings = SettingsInput {
            condition: Some(ConditionKind::ProgramEnd),
            ..duration_settings(0)
        };
        timer.set_enabled_in(true, Some(settings), &jst()).unwrap();

        assert_eq!(timer.on_timer(TimerId::Query), None);
        assert_eq!(timer.status().tracked_event, Some(100));
        assert_eq!(timer.status().last_action.as_deref(), Some("waiting for end of Drama"));

        timer.host_mut().program = Some(ProgramInfo {
            event_id: 101,
            start_time: start_epg + Duration::minutes(30),
            duration_seconds: 60 * 60,
            name: "News".to_string(),
        });
        assert_eq!(timer.on_timer(TimerId::Query), Some(SleepOutcome::Completed));
        assert_eq!(timer.host().calls, vec![Call::SelectChannel(1024), Call::Sleep]);
    }

    #[test]
    fn date_time_uses_local_zone_for_input() {
        let mut timer = session(no_confirm());
        let local = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(21, 30, 0)
            .unwrap();
        let settings = SettingsInput {
            condition: Some(ConditionKind::DateTime),
            date_time: Some(local),
            ..duration_settings(0)
        };
        timer.set_enabled_in(true, Some(settings), &jst()).unwrap();

        assert_eq!(timer.status().remaining_seconds, Some(30 * 60));
        assert_eq!(timer.on_timer(TimerId::Query), None);

        timer.host_mut().now += Duration::minutes(30);
        assert_eq!(timer.on_timer(TimerId::Query), Some(SleepOutcome::Completed));
    }

    #[test]
    fn zero_timeout_confirmation_waits_for_answer() {
        let mut timer = session(PluginOptions {
            confirm_timeout_seconds: 0,
            ..PluginOptions::default()
        });
        timer.set_enabled_in(true, Some(duration_settings(30)), &jst()).unwrap();

        assert_eq!(timer.on_timer(TimerId::Sleep), Some(SleepOutcome::AwaitingConfirmation));
        assert!(!timer.host().timers.contains_key(&TimerId::Confirm));
        assert_eq!(timer.host().calls, vec![Call::ShowConfirmation(None)]);
        assert!(timer.is_confirming());
    }
}
