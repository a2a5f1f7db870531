//! Value types owned or produced by the [`RunController`](super::RunController).

use core::fmt;

use serde::Serialize;

/// What started the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunMode {
    /// Started by the operator (arming presses or an explicit command).
    Manual,
    /// Started by schedule slot `index`.
    Scheduled(usize),
}

/// Bookkeeping for the active run.  Exists only while the relay is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunState {
    pub mode: RunMode,
    pub steps_required: u32,
    pub steps_completed: u32,
    pub start_ms: u64,
}

impl RunState {
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.start_ms)
    }
}

/// Controller state: either idle or driving exactly one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Running(RunState),
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// The required number of steps was counted.
    Completed,
    /// The failsafe ceiling elapsed before the steps arrived.
    Timeout,
    /// An external emergency stop.
    Emergency,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Timeout => write!(f, "timeout"),
            Self::Emergency => write!(f, "emergency stop"),
        }
    }
}

/// Summary of a finished run, produced by every stop path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopReport {
    pub mode: RunMode,
    pub reason: StopReason,
    pub steps_completed: u32,
    pub steps_required: u32,
    pub started_ms: u64,
    pub stopped_ms: u64,
}

impl StopReport {
    pub fn duration_ms(&self) -> u64 {
        self.stopped_ms.saturating_sub(self.started_ms)
    }
}

/// What a debounced rising edge did to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// Counted as a motor step of the active run.
    Step { completed: u32, required: u32 },
    /// The step that completed the run; the relay is now off.
    Completed(StopReport),
    /// Counted as an arming press while idle.
    Arming { presses: u32, needed: u32 },
    /// The arming press that reached the threshold and requested a manual
    /// start, with its result.
    Armed(Result<RunState, crate::error::Rejection>),
    /// Idle with manual triggering disabled.
    Ignored,
}
