//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use serde::Serialize;

use crate::error::Rejection;
use crate::fsm::{RunMode, StopReport};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started.
    Started,

    /// A run took the relay.
    RunStarted { mode: RunMode, steps_required: u32 },

    /// A run ended (completion, failsafe timeout or emergency stop).
    RunStopped(StopReport),

    /// Schedule slot `index` came due.
    ScheduleFired { index: usize },

    /// A start request was refused.
    StartRejected {
        source: StartSource,
        reason: Rejection,
    },

    /// Configuration was replaced at runtime.
    ConfigUpdated,

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),
}

/// Where a start request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StartSource {
    /// An explicit manual-start command.
    Manual,
    /// Schedule slot, fired by the clock or on demand.
    Schedule(usize),
    /// Arming presses on the switch.
    Arming,
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryData {
    pub uptime_ms: u64,
    pub running: bool,
    /// Energised exactly while `running`.
    pub relay_active: bool,
    pub mode: Option<RunMode>,
    pub steps_completed: u32,
    pub steps_required: u32,
    pub run_elapsed_ms: u64,
    pub cooldown_remaining_ms: u64,
    pub idle_presses: u32,
    pub manual_enabled: bool,
    pub scheduler_enabled: bool,
    pub runs_completed: u32,
    pub runs_timed_out: u32,
    pub runs_emergency_stopped: u32,
    pub config_dirty: bool,
}
