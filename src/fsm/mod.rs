//! Run controller: the motor relay state machine.
//!
//! ```text
//!                 request_manual_start / request_scheduled_start
//!        ┌──────┐ ─────────────────────────────────────────────▶ ┌─────────────────┐
//!        │ Idle │                                                │ Running(state)  │
//!        └──────┘ ◀───────────────────────────────────────────── └─────────────────┘
//!          │  ▲     on_edge (last step) · tick (failsafe) · stop        │
//!          └──┘                                                         └─┐
//!   on_edge: arming press                                  on_edge: step ◀┘
//! ```
//!
//! Exactly one run can own the relay.  Manual and scheduled requests are
//! mutually exclusive: a request that arrives while a run is active is
//! refused, never queued.  The relay is energised if and only if the
//! controller is `Running`.
//!
//! While idle (and manual triggering is enabled) each rising edge is an
//! *arming press*; reaching `manual_step_count` presses requests a manual
//! run.  While running, each edge is one completed motor step.
//!
//! All three stop paths (step completion, failsafe timeout, emergency
//! stop) go through [`RunController::stop`] and leave identical state
//! behind; only the reported [`StopReason`] differs.

pub mod states;

use log::{info, warn};

use crate::app::ports::RelayActuator;
use crate::config::FeederConfig;
use crate::error::Rejection;
use crate::safety::{Cooldown, Failsafe};

pub use states::{ControllerState, EdgeOutcome, RunMode, RunState, StopReason, StopReport};

pub struct RunController {
    state: ControllerState,
    cooldown: Cooldown,
    failsafe: Failsafe,
    /// Steps per manual run, and arming presses needed to start one.
    manual_step_count: u32,
    manual_enabled: bool,
    /// Arming presses counted while idle.
    idle_presses: u32,
}

impl RunController {
    pub fn new(config: &FeederConfig) -> Self {
        Self {
            state: ControllerState::Idle,
            cooldown: Cooldown::new(u64::from(config.cooldown_ms)),
            failsafe: Failsafe::new(u64::from(config.max_run_ms)),
            manual_step_count: config.manual_step_count.max(1),
            manual_enabled: config.manual_trigger_enabled,
            idle_presses: 0,
        }
    }

    /// Adopt new timing and trigger settings.  An active run keeps its
    /// step target; the new ceiling applies from the next tick.
    pub fn apply_config(&mut self, config: &FeederConfig) {
        self.cooldown.set_window_ms(u64::from(config.cooldown_ms));
        self.failsafe.set_max_run_ms(u64::from(config.max_run_ms));
        self.manual_step_count = config.manual_step_count.max(1);
        self.set_manual_enabled(config.manual_trigger_enabled);
    }

    // ── Start requests ────────────────────────────────────────

    /// Start a manual run of `manual_step_count` steps.
    ///
    /// Refused if manual triggering is disabled, a run is active, or the
    /// cooldown since the last stop has not elapsed.
    pub fn request_manual_start(
        &mut self,
        now_ms: u64,
        relay: &mut impl RelayActuator,
    ) -> Result<RunState, Rejection> {
        let result = self.check_manual_start(now_ms);
        match result {
            Ok(()) => Ok(self.begin(RunMode::Manual, self.manual_step_count, now_ms, relay)),
            Err(reason) => {
                warn!("Run: manual start rejected ({})", reason);
                Err(reason)
            }
        }
    }

    /// Start a scheduled run for slot `index` requiring `steps_required`
    /// steps.  Only exclusivity is checked; the cooldown guards manual
    /// starts alone.
    pub fn request_scheduled_start(
        &mut self,
        index: usize,
        steps_required: u32,
        now_ms: u64,
        relay: &mut impl RelayActuator,
    ) -> Result<RunState, Rejection> {
        if steps_required == 0 {
            warn!("Run: schedule slot {} rejected (zero steps)", index);
            return Err(Rejection::InvalidStepCount);
        }
        if self.is_running() {
            warn!("Run: schedule slot {} dropped, a run is already active", index);
            return Err(Rejection::RunActive);
        }
        Ok(self.begin(RunMode::Scheduled(index), steps_required, now_ms, relay))
    }

    // ── Inputs ────────────────────────────────────────────────

    /// Deliver one debounced rising edge.
    pub fn on_edge(&mut self, now_ms: u64, relay: &mut impl RelayActuator) -> EdgeOutcome {
        if let ControllerState::Running(run) = &mut self.state {
            run.steps_completed += 1;
            let (completed, required) = (run.steps_completed, run.steps_required);
            if completed >= required {
                return match self.stop(StopReason::Completed, now_ms, relay) {
                    Some(report) => EdgeOutcome::Completed(report),
                    None => EdgeOutcome::Ignored,
                };
            }
            return EdgeOutcome::Step {
                completed,
                required,
            };
        }

        if !self.manual_enabled {
            return EdgeOutcome::Ignored;
        }

        self.idle_presses += 1;
        if self.idle_presses < self.manual_step_count {
            info!(
                "Run: arming press {}/{}",
                self.idle_presses, self.manual_step_count
            );
            return EdgeOutcome::Arming {
                presses: self.idle_presses,
                needed: self.manual_step_count,
            };
        }

        self.idle_presses = 0;
        EdgeOutcome::Armed(self.request_manual_start(now_ms, relay))
    }

    /// Failsafe check.  Call every loop iteration *after* any edge for
    /// that iteration has been delivered.
    pub fn tick(&mut self, now_ms: u64, relay: &mut impl RelayActuator) -> Option<StopReport> {
        match self.state {
            ControllerState::Running(run) if self.failsafe.expired(run.start_ms, now_ms) => {
                self.stop(StopReason::Timeout, now_ms, relay)
            }
            _ => None,
        }
    }

    /// Stop the active run.  Idempotent: returns `None` when already idle.
    pub fn stop(
        &mut self,
        reason: StopReason,
        now_ms: u64,
        relay: &mut impl RelayActuator,
    ) -> Option<StopReport> {
        let ControllerState::Running(run) = self.state else {
            return None;
        };

        relay.set_active(false);
        self.state = ControllerState::Idle;
        self.cooldown.record_stop(now_ms);

        let report = StopReport {
            mode: run.mode,
            reason,
            steps_completed: run.steps_completed,
            steps_required: run.steps_required,
            started_ms: run.start_ms,
            stopped_ms: now_ms,
        };
        match reason {
            StopReason::Completed => info!(
                "Run: {:?} completed, {} steps in {} ms",
                run.mode,
                run.steps_completed,
                report.duration_ms()
            ),
            StopReason::Timeout | StopReason::Emergency => warn!(
                "Run: {:?} stopped by {} after {} ms ({}/{} steps)",
                run.mode,
                reason,
                report.duration_ms(),
                run.steps_completed,
                run.steps_required
            ),
        }
        Some(report)
    }

    // ── Settings ──────────────────────────────────────────────

    /// Enable or disable arming presses and manual start requests.
    /// Disabling discards any partial arming count.
    pub fn set_manual_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.idle_presses = 0;
        }
        self.manual_enabled = enabled;
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, ControllerState::Running(_))
    }

    /// The active run, if any.
    pub fn run(&self) -> Option<RunState> {
        match self.state {
            ControllerState::Running(run) => Some(run),
            ControllerState::Idle => None,
        }
    }

    /// Steps of the active run (0 when idle).
    pub fn steps_completed(&self) -> u32 {
        self.run().map_or(0, |r| r.steps_completed)
    }

    pub fn idle_presses(&self) -> u32 {
        self.idle_presses
    }

    pub fn manual_enabled(&self) -> bool {
        self.manual_enabled
    }

    pub fn cooldown_remaining_ms(&self, now_ms: u64) -> u64 {
        self.cooldown.remaining_ms(now_ms)
    }

    // ── Internal ──────────────────────────────────────────────

    fn check_manual_start(&self, now_ms: u64) -> Result<(), Rejection> {
        if !self.manual_enabled {
            return Err(Rejection::ManualDisabled);
        }
        if self.is_running() {
            return Err(Rejection::RunActive);
        }
        self.cooldown.check(now_ms)
    }

    fn begin(
        &mut self,
        mode: RunMode,
        steps_required: u32,
        now_ms: u64,
        relay: &mut impl RelayActuator,
    ) -> RunState {
        let run = RunState {
            mode,
            steps_required,
            steps_completed: 0,
            start_ms: now_ms,
        };
        self.state = ControllerState::Running(run);
        self.idle_presses = 0;
        relay.set_active(true);
        info!("Run: {:?} started, {} steps required", mode, steps_required);
        run
    }
}
