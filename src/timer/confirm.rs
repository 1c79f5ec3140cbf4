//! Confirmation step shown before the sleep sequence continues

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Countdown step of the confirmation prompt
pub const CONFIRM_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accept,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStatus {
    /// Still waiting; `None` when there is no timeout
    Pending(Option<u32>),
    Decided(Decision),
}

/// Counts one-second ticks while the user has not answered.
/// Reaching the timeout counts as acceptance; a zero timeout waits forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationGate {
    timeout_seconds: u32,
    elapsed_ticks: u32,
    decision: Option<Decision>,
}

impl ConfirmationGate {
    pub fn new(timeout_seconds: u32) -> Self {
        Self {
            timeout_seconds,
            elapsed_ticks: 0,
            decision: None,
        }
    }

    pub fn elapsed_ticks(&self) -> u32 {
        self.elapsed_ticks
    }

    /// Seconds left before the implicit accept
    pub fn remaining(&self) -> Option<u32> {
        (self.timeout_seconds > 0).then(|| self.timeout_seconds.saturating_sub(self.elapsed_ticks))
    }

    pub fn status(&self) -> GateStatus {
        match self.decision {
            Some(decision) => GateStatus::Decided(decision),
            None => GateStatus::Pending(self.remaining()),
        }
    }

    pub fn tick(&mut self) -> GateStatus {
        if self.decision.is_none() && self.timeout_seconds > 0 {
            self.elapsed_ticks += 1;
            if self.elapsed_ticks >= self.timeout_seconds {
                self.decision = Some(Decision::Accept);
            }
        }
        self.status()
    }

    /// Records a manual answer. The first decision wins.
    pub fn decide(&mut self, decision: Decision) -> GateStatus {
        if self.decision.is_none() {
            self.decision = Some(decision);
        }
        self.status()
    }
}
