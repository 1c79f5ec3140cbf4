//! Sleep timer core
//!
//! Settings validation, the tick-driven engine and the confirmation gate.
//! Nothing in here performs I/O; all host access goes through `crate::host`.

pub mod clock;
pub mod confirm;
pub mod engine;
pub mod settings;

pub use confirm::{ConfirmationGate, Decision, GateStatus};
pub use engine::{TickOutcome, TimerEngine};
pub use settings::{
    ConditionKind, SettingsError, SettingsInput, SleepCondition, TimerConfiguration, ValidationLimits,
};
