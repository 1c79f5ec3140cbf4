//! Message loop owning the plug-in session
//!
//! Host notifications arrive as [`Command`]s and timer ticks come from the
//! schedules registered on the [`RuntimeHost`]. Both are handled one at a
//! time on this task, so the session needs no locking.

use tokio::{
    sync::{mpsc, oneshot},
    time::{sleep_until, Instant},
};
use tracing::{debug, error, info, warn};

use super::runtime_host::{HostAction, RuntimeHost};
use crate::{
    host::{ChannelCatalog, ChannelDirectory, ProgramInfo, RecordingStatus, ServiceInfo},
    services::{execute_channel_switch, execute_system_sleep, SleepMode},
    state::{ChannelTimer, SessionError, SessionStatus, SleepOutcome},
    timer::{Decision, SettingsInput},
};

pub type Reply<T> = oneshot::Sender<T>;

/// Requests delivered to the session from outside the loop
#[derive(Debug)]
pub enum Command {
    Enable {
        settings: Option<SettingsInput>,
        reply: Reply<Result<SessionStatus, SessionError>>,
    },
    Disable {
        reply: Reply<SessionStatus>,
    },
    ApplySettings {
        settings: SettingsInput,
        reply: Reply<Result<SessionStatus, SessionError>>,
    },
    Confirm {
        decision: Decision,
        reply: Reply<Result<SleepOutcome, SessionError>>,
    },
    UpdateProgram(Option<ProgramInfo>),
    UpdateRecording(Option<RecordingStatus>),
    UpdateCatalog(ChannelCatalog),
    Status {
        reply: Reply<SessionStatus>,
    },
    Drivers {
        reply: Reply<Vec<String>>,
    },
    TuningSpaces {
        driver: String,
        reply: Reply<Vec<String>>,
    },
    Channels {
        driver: String,
        space: usize,
        reply: Reply<Vec<ServiceInfo>>,
    },
}

/// Carries out queued host actions
#[derive(Debug, Clone, Default)]
pub struct ActionRunner {
    /// Template for the channel switch command, see `services::channel`
    pub switch_command: Option<String>,
    /// Power state requested from systemd
    pub sleep_mode: SleepMode,
    /// Log actions instead of running them
    pub dry_run: bool,
}

impl ActionRunner {
    pub async fn run(&self, action: HostAction) {
        match action {
            HostAction::SelectChannel(target) => match (&self.switch_command, self.dry_run) {
                (Some(template), false) => {
                    if let Err(e) = execute_channel_switch(template, &target).await {
                        error!("Failed to switch channel: {}", e);
                    }
                }
                _ => info!("Channel switch to {} not executed (no command or dry run)", target.name),
            },
            HostAction::Suspend => {
                if self.dry_run {
                    info!("Dry run: skipping system {}", self.sleep_mode);
                } else if let Err(e) = execute_system_sleep(self.sleep_mode).await {
                    error!("Failed to put the system to sleep: {}", e);
                }
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Runs the session until the command channel closes
pub async fn timer_loop_task(
    mut session: ChannelTimer<RuntimeHost>,
    mut commands: mpsc::Receiver<Command>,
    runner: ActionRunner,
) {
    info!("Starting channel timer loop");

    loop {
        let next = session.host().next_due();

        tokio::select! {
            _ = wait_until(next.map(|(_, at)| at)) => {
                if let Some((timer, _)) = next {
                    session.host_mut().fire(timer);
                    if let Some(outcome) = session.on_timer(timer) {
                        info!("Sleep sequence: {:?}", outcome);
                    }
                }
            }

            command = commands.recv() => match command {
                Some(command) => handle_command(&mut session, command),
                None => {
                    info!("Command channel closed, stopping timer loop");
                    break;
                }
            }
        }

        for action in session.host_mut().take_actions() {
            runner.run(action).await;
        }
    }
}

fn send<T>(reply: Reply<T>, value: T) {
    if reply.send(value).is_err() {
        warn!("Requester went away before the reply was sent");
    }
}

fn handle_command(session: &mut ChannelTimer<RuntimeHost>, command: Command) {
    debug!("Handling command: {:?}", command);

    match command {
        Command::Enable { settings, reply } => {
            let result = session.set_enabled(true, settings).map(|_| session.status());
            send(reply, result);
        }
        Command::Disable { reply } => {
            if let Err(e) = session.set_enabled(false, None) {
                error!("Failed to disable timer: {}", e);
            }
            send(reply, session.status());
        }
        Command::ApplySettings { settings, reply } => {
            let result = session.apply_settings(&settings).map(|_| session.status());
            send(reply, result);
        }
        Command::Confirm { decision, reply } => {
            let result = session.confirm(decision);
            if let Ok(outcome) = &result {
                info!("Confirmation answered with {:?}: {:?}", decision, outcome);
            }
            send(reply, result);
        }
        Command::UpdateProgram(program) => session.host_mut().set_program(program),
        Command::UpdateRecording(status) => session.host_mut().set_recording(status),
        Command::UpdateCatalog(catalog) => session.host_mut().set_catalog(catalog),
        Command::Status { reply } => send(reply, session.status()),
        Command::Drivers { reply } => send(reply, session.host().drivers()),
        Command::TuningSpaces { driver, reply } => send(reply, session.host().tuning_spaces(&driver)),
        Command::Channels { driver, space, reply } => send(reply, session.host().channels(&driver, space)),
    }
}
