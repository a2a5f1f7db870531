//! Application service, the hexagonal core.
//!
//! [`AppService`] owns the debouncer, the run controller and the
//! scheduler, plus the live configuration.  It exposes a clean,
//! hardware-agnostic API.  All I/O flows through port traits injected at
//! call sites, making the entire service testable with mock adapters.
//!
//! ```text
//!   SwitchPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!    ClockPort ──▶ │          AppService           │
//! RelayActuator ◀──│ Debouncer · RunController ·   │
//!                  │ Scheduler                      │
//!                  └──────────────────────────────┘
//! ```
//!
//! One call to [`AppService::tick`] is one loop iteration:
//!
//! 1. the scheduler is polled and may start a scheduled run,
//! 2. the switch is sampled and any rising edge goes to the controller,
//! 3. the failsafe ceiling is checked.
//!
//! Edges are delivered before the failsafe check so a completing step is
//! never pre-empted by a timeout in the same iteration.

use log::{info, warn};

use crate::config::{FeederConfig, ScheduleSlot};
use crate::drivers::debounce::{Debouncer, EdgeEvent};
use crate::error::Result;
use crate::fsm::{EdgeOutcome, RunController, RunState, StopReason, StopReport};
use crate::scheduler::Scheduler;

use super::commands::AppCommand;
use super::events::{AppEvent, StartSource, TelemetryData};
use super::ports::{ClockPort, ConfigPort, EventSink, RelayActuator, SwitchPort};

/// Delay between the first unsaved config change and the automatic NVS
/// write.  Later changes do not push the write back.
pub const AUTO_SAVE_DELAY_MS: u64 = 5_000;

/// Stop counters since boot, by reason.
#[derive(Debug, Clone, Copy, Default)]
struct RunStats {
    completed: u32,
    timed_out: u32,
    emergency: u32,
}

impl RunStats {
    fn record(&mut self, report: &StopReport) {
        let counter = match report.reason {
            StopReason::Completed => &mut self.completed,
            StopReason::Timeout => &mut self.timed_out,
            StopReason::Emergency => &mut self.emergency,
        };
        *counter = counter.saturating_add(1);
    }
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    config: FeederConfig,
    debouncer: Debouncer,
    controller: RunController,
    scheduler: Scheduler,
    stats: RunStats,
    /// Monotonic time at which pending config changes should be written.
    /// `None` while the stored config is current.
    save_due_ms: Option<u64>,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// The relay is not touched here; the adapter that owns it starts
    /// inactive.
    pub fn new(config: FeederConfig) -> Self {
        let debouncer = Debouncer::new(u64::from(config.debounce_window_ms));
        let controller = RunController::new(&config);
        let scheduler = Scheduler::new(&config.schedule);

        Self {
            config,
            debouncer,
            controller,
            scheduler,
            stats: RunStats::default(),
            save_due_ms: None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started);
        info!(
            "AppService started ({} schedule slots, manual trigger {})",
            self.scheduler.entries().len(),
            if self.controller.manual_enabled() { "on" } else { "off" }
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control iteration: scheduler → switch edge → failsafe.
    ///
    /// The `hw` parameter satisfies **both** [`SwitchPort`] and
    /// [`RelayActuator`]; this avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        hw: &mut (impl SwitchPort + RelayActuator),
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) {
        let now = clock.monotonic_ms();

        // 1. Scheduler
        if let Some(req) = self.scheduler.tick(clock.wall_clock()) {
            sink.emit(&AppEvent::ScheduleFired { index: req.index });
            // A refused start is already reported; the slot stays marked
            // for today either way.
            let _ = self.start_scheduled(req.index, req.steps_required, now, hw, sink);
        }

        // 2. Switch edge
        let raw = hw.read_switch();
        if self.debouncer.poll(raw, now) == EdgeEvent::RisingEdge {
            match self.controller.on_edge(now, hw) {
                EdgeOutcome::Completed(report) => self.on_stopped(report, sink),
                EdgeOutcome::Armed(Ok(run)) => emit_started(&run, sink),
                EdgeOutcome::Armed(Err(reason)) => sink.emit(&AppEvent::StartRejected {
                    source: StartSource::Arming,
                    reason,
                }),
                EdgeOutcome::Step { .. } | EdgeOutcome::Arming { .. } | EdgeOutcome::Ignored => {}
            }
        }

        // 3. Failsafe
        if let Some(report) = self.controller.tick(now, hw) {
            self.on_stopped(report, sink);
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.
    ///
    /// Refused starts and invalid reconfiguration return an error and
    /// leave all state untouched.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut impl RelayActuator,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let now = clock.monotonic_ms();
        match cmd {
            AppCommand::StartManual => match self.controller.request_manual_start(now, hw) {
                Ok(run) => emit_started(&run, sink),
                Err(reason) => {
                    sink.emit(&AppEvent::StartRejected {
                        source: StartSource::Manual,
                        reason,
                    });
                    return Err(reason.into());
                }
            },
            AppCommand::StartScheduled(index) => {
                let steps = self.scheduler.entry(index)?.steps_required;
                info!("Schedule slot {} started on demand", index);
                self.start_scheduled(index, steps, now, hw, sink)?;
            }
            AppCommand::EmergencyStop => {
                match self.controller.stop(StopReason::Emergency, now, hw) {
                    Some(report) => self.on_stopped(report, sink),
                    None => info!("Emergency stop while idle, nothing to do"),
                }
            }
            AppCommand::SetManualTrigger(enabled) => {
                self.controller.set_manual_enabled(enabled);
                self.config.manual_trigger_enabled = enabled;
                self.mark_config_dirty(now);
                info!("Manual trigger {}", if enabled { "enabled" } else { "disabled" });
            }
            AppCommand::SetSchedulerEnabled(enabled) => {
                self.scheduler.set_enabled(enabled);
                info!("Scheduler {}", if enabled { "enabled" } else { "disabled" });
            }
            AppCommand::SetScheduleEntry {
                index,
                hour,
                minute,
                steps,
            } => {
                let slot = ScheduleSlot { hour, minute, steps };
                self.scheduler.set_entry(index, slot)?;
                if let Some(stored) = self.config.schedule.get_mut(index) {
                    *stored = slot;
                }
                self.mark_config_dirty(now);
            }
            AppCommand::UpdateConfig(new_config) => {
                new_config.validate()?;
                self.apply_config(new_config);
                self.mark_config_dirty(now);
                sink.emit(&AppEvent::ConfigUpdated);
                info!("Configuration updated at runtime");
            }
            AppCommand::SaveConfig => {
                self.save_due_ms = Some(now);
                info!("Explicit config save requested (will flush on next auto-save check)");
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot at monotonic time `now_ms`.  The relay
    /// state is read back from the actuator, not inferred from the run.
    pub fn build_telemetry(&self, now_ms: u64, relay: &impl RelayActuator) -> TelemetryData {
        let run = self.controller.run();
        TelemetryData {
            uptime_ms: now_ms,
            running: run.is_some(),
            relay_active: relay.is_active(),
            mode: run.map(|r| r.mode),
            steps_completed: run.map_or(0, |r| r.steps_completed),
            steps_required: run.map_or(0, |r| r.steps_required),
            run_elapsed_ms: run.map_or(0, |r| r.elapsed_ms(now_ms)),
            cooldown_remaining_ms: self.controller.cooldown_remaining_ms(now_ms),
            idle_presses: self.controller.idle_presses(),
            manual_enabled: self.controller.manual_enabled(),
            scheduler_enabled: self.scheduler.is_enabled(),
            runs_completed: self.stats.completed,
            runs_timed_out: self.stats.timed_out,
            runs_emergency_stopped: self.stats.emergency,
            config_dirty: self.is_config_dirty(),
        }
    }

    pub fn controller(&self) -> &RunController {
        &self.controller
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn config(&self) -> &FeederConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn start_scheduled(
        &mut self,
        index: usize,
        steps_required: u32,
        now_ms: u64,
        relay: &mut impl RelayActuator,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        match self
            .controller
            .request_scheduled_start(index, steps_required, now_ms, relay)
        {
            Ok(run) => {
                emit_started(&run, sink);
                Ok(())
            }
            Err(reason) => {
                sink.emit(&AppEvent::StartRejected {
                    source: StartSource::Schedule(index),
                    reason,
                });
                Err(reason.into())
            }
        }
    }

    fn on_stopped(&mut self, report: StopReport, sink: &mut impl EventSink) {
        self.stats.record(&report);
        sink.emit(&AppEvent::RunStopped(report));
    }

    /// Push a validated config into the live components.
    fn apply_config(&mut self, new_config: FeederConfig) {
        self.debouncer
            .set_window_ms(u64::from(new_config.debounce_window_ms));
        self.controller.apply_config(&new_config);
        // Reloading resets the per-day fire guards, so only do it when the
        // table actually changed.
        if new_config.schedule != self.config.schedule {
            self.scheduler.load(&new_config.schedule);
        }
        if new_config.relay_polarity != self.config.relay_polarity {
            warn!("Relay polarity change takes effect after restart");
        }
        self.config = new_config;
    }

    // ── Config dirty-flag management ──────────────────────────

    /// Mark the config as modified.  The save is scheduled
    /// [`AUTO_SAVE_DELAY_MS`] after the *first* unsaved change.
    pub fn mark_config_dirty(&mut self, now_ms: u64) {
        if self.save_due_ms.is_none() {
            self.save_due_ms = Some(now_ms + AUTO_SAVE_DELAY_MS);
        }
    }

    /// Save the config if a change is pending and its delay has elapsed.
    /// Returns `true` if the config was saved.
    pub fn auto_save_if_needed(&mut self, storage: &impl ConfigPort, now_ms: u64) -> bool {
        match self.save_due_ms {
            Some(due) if now_ms >= due => {}
            _ => return false,
        }
        match storage.save(&self.config) {
            Ok(()) => {
                self.save_due_ms = None;
                info!("Config auto-saved to NVS");
                true
            }
            Err(e) => {
                warn!("Config auto-save failed: {}", e);
                false
            }
        }
    }

    /// Save immediately if dirty (call before a deliberate restart).
    pub fn force_save_if_dirty(&mut self, storage: &impl ConfigPort) {
        if self.save_due_ms.is_none() {
            return;
        }
        match storage.save(&self.config) {
            Ok(()) => {
                self.save_due_ms = None;
                info!("Config force-saved");
            }
            Err(e) => {
                warn!("Config force-save failed: {}", e);
            }
        }
    }

    /// Whether the config has unsaved changes.
    pub fn is_config_dirty(&self) -> bool {
        self.save_due_ms.is_some()
    }
}

fn emit_started(run: &RunState, sink: &mut impl EventSink) {
    sink.emit(&AppEvent::RunStarted {
        mode: run.mode,
        steps_required: run.steps_required,
    });
}
