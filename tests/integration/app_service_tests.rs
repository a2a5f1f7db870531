//! Integration tests for the switch → AppService → relay pipeline.
//!
//! These run on the host (x86_64) and drive the service the way the
//! firmware loop does: one `tick` per 10 ms, the switch level set on the
//! mock hardware, time advanced by hand.

use crate::mock_hw::{ManualClock, MockHardware, MockNvs, RecordingSink};

use feeder::adapters::console::parse_command;
use feeder::app::commands::AppCommand;
use feeder::app::events::{AppEvent, StartSource};
use feeder::app::ports::{ClockPort, ConfigPort};
use feeder::app::service::{AUTO_SAVE_DELAY_MS, AppService};
use feeder::config::FeederConfig;
use feeder::error::{Error, Rejection};
use feeder::fsm::{RunMode, StopReason, StopReport};

const TICK_MS: u64 = 10;

struct Rig {
    app: AppService,
    hw: MockHardware,
    clock: ManualClock,
    sink: RecordingSink,
}

impl Rig {
    fn new(config: FeederConfig) -> Self {
        let mut app = AppService::new(config);
        let mut sink = RecordingSink::new();
        app.start(&mut sink);
        Self {
            app,
            hw: MockHardware::new(),
            clock: ManualClock::new(),
            sink,
        }
    }

    fn tick(&mut self) {
        self.clock.advance(TICK_MS);
        self.app.tick(&mut self.hw, &self.clock, &mut self.sink);
    }

    fn run_for(&mut self, ms: u64) {
        for _ in 0..ms / TICK_MS {
            self.tick();
        }
    }

    /// One clean physical press: held 80 ms, released 80 ms.
    fn press(&mut self) {
        self.hw.press();
        self.run_for(80);
        self.hw.release();
        self.run_for(80);
    }

    fn command(&mut self, cmd: AppCommand) -> Result<(), Error> {
        self.app
            .handle_command(cmd, &mut self.hw, &self.clock, &mut self.sink)
    }

    fn stops(&self) -> Vec<StopReport> {
        self.sink
            .events
            .iter()
            .filter_map(|e| match e {
                AppEvent::RunStopped(r) => Some(*r),
                _ => None,
            })
            .collect()
    }
}

// ── Arming presses → manual run → step completion ────────────

#[test]
fn arming_presses_start_run_and_steps_complete_it() {
    let mut rig = Rig::new(FeederConfig::default());
    assert_eq!(rig.sink.events, vec![AppEvent::Started]);

    rig.press();
    rig.press();
    assert!(rig.hw.relay_calls.is_empty(), "arming must not move the motor");
    assert_eq!(rig.app.controller().idle_presses(), 2);

    rig.press();
    assert!(rig.sink.events.contains(&AppEvent::RunStarted {
        mode: RunMode::Manual,
        steps_required: 3
    }));
    assert_eq!(rig.hw.relay_calls, vec![true]);

    rig.press();
    rig.press();
    assert!(rig.app.controller().is_running());
    rig.press();

    let stops = rig.stops();
    assert_eq!(stops.len(), 1);
    assert_eq!(stops[0].reason, StopReason::Completed);
    assert_eq!(stops[0].steps_completed, 3);
    assert_eq!(rig.hw.relay_calls, vec![true, false]);
    assert!(!rig.app.controller().is_running());
}

// ── Bounce produces one step ──────────────────────────────────

#[test]
fn contact_bounce_counts_as_one_step() {
    let mut rig = Rig::new(FeederConfig::default());
    rig.command(AppCommand::StartManual).unwrap();

    for level in [true, false, true, false, true] {
        if level {
            rig.hw.press();
        } else {
            rig.hw.release();
        }
        rig.tick();
    }
    rig.run_for(100);
    rig.hw.release();
    rig.run_for(100);

    assert_eq!(rig.app.controller().steps_completed(), 1);
}

// ── Cooldown after a stop ─────────────────────────────────────

#[test]
fn manual_start_waits_out_cooldown() {
    let mut rig = Rig::new(FeederConfig::default());
    rig.command(AppCommand::StartManual).unwrap();
    for _ in 0..3 {
        rig.press();
    }
    let stopped_ms = rig.stops()[0].stopped_ms;

    rig.clock.set_ms(stopped_ms + 2_999);
    let err = rig.command(AppCommand::StartManual).unwrap_err();
    assert_eq!(err, Error::Rejected(Rejection::CoolingDown { remaining_ms: 1 }));
    assert_eq!(
        rig.sink.events.last(),
        Some(&AppEvent::StartRejected {
            source: StartSource::Manual,
            reason: Rejection::CoolingDown { remaining_ms: 1 }
        })
    );
    assert!(!rig.app.controller().is_running());

    rig.clock.set_ms(stopped_ms + 3_000);
    rig.command(AppCommand::StartManual).unwrap();
    assert!(rig.app.controller().is_running());
}

#[test]
fn arming_during_cooldown_reports_rejection() {
    let config = FeederConfig {
        cooldown_ms: 10_000,
        ..FeederConfig::default()
    };
    let mut rig = Rig::new(config);
    rig.command(AppCommand::StartManual).unwrap();
    rig.command(AppCommand::EmergencyStop).unwrap();

    for _ in 0..3 {
        rig.press();
    }
    assert!(!rig.app.controller().is_running());
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            AppEvent::StartRejected {
                source: StartSource::Arming,
                reason: Rejection::CoolingDown { .. }
            }
        )),
        1
    );
}

// ── Failsafe ──────────────────────────────────────────────────

#[test]
fn stuck_switch_is_stopped_by_failsafe() {
    let mut rig = Rig::new(FeederConfig::default());
    rig.command(AppCommand::StartManual).unwrap();

    // Held closed forever: one edge, then nothing.
    rig.hw.press();
    rig.run_for(59_990);
    assert!(rig.app.controller().is_running());
    rig.tick();

    let stops = rig.stops();
    assert_eq!(stops.len(), 1);
    assert_eq!(stops[0].reason, StopReason::Timeout);
    assert_eq!(stops[0].steps_completed, 1);
    assert_eq!(stops[0].duration_ms(), 60_000);
    assert_eq!(rig.hw.relay_calls, vec![true, false]);
    assert_eq!(rig.app.build_telemetry(60_000, &rig.hw).runs_timed_out, 1);
}

#[test]
fn completing_edge_beats_failsafe_in_same_iteration() {
    let config = FeederConfig {
        max_run_ms: 1_000,
        manual_step_count: 1,
        ..FeederConfig::default()
    };
    let mut rig = Rig::new(config);
    rig.command(AppCommand::StartManual).unwrap();

    // Raw change seen at 940, committed at 1000: the ceiling tick.
    rig.clock.set_ms(930);
    rig.hw.press();
    rig.run_for(70);
    assert_eq!(rig.clock.monotonic_ms(), 1_000);

    let stops = rig.stops();
    assert_eq!(stops.len(), 1);
    assert_eq!(stops[0].reason, StopReason::Completed);
}

// ── Emergency stop ────────────────────────────────────────────

#[test]
fn emergency_stop_is_idempotent() {
    let mut rig = Rig::new(FeederConfig::default());
    rig.sink.clear();

    rig.command(AppCommand::EmergencyStop).unwrap();
    assert!(rig.sink.events.is_empty());
    assert!(rig.hw.relay_calls.is_empty());

    rig.command(AppCommand::StartManual).unwrap();
    rig.run_for(500);
    rig.command(AppCommand::EmergencyStop).unwrap();
    rig.command(AppCommand::EmergencyStop).unwrap();

    let stops = rig.stops();
    assert_eq!(stops.len(), 1);
    assert_eq!(stops[0].reason, StopReason::Emergency);
    assert_eq!(rig.hw.relay_calls, vec![true, false]);
}

// ── Mutual exclusion ──────────────────────────────────────────

#[test]
fn scheduled_slot_cannot_preempt_manual_run() {
    let mut rig = Rig::new(FeederConfig::default());
    rig.command(AppCommand::StartManual).unwrap();

    assert_eq!(
        rig.command(AppCommand::StartScheduled(0)),
        Err(Error::Rejected(Rejection::RunActive))
    );
    assert_eq!(
        rig.app.controller().run().map(|r| r.mode),
        Some(RunMode::Manual)
    );
    assert_eq!(rig.hw.relay_calls, vec![true]);
}

#[test]
fn start_scheduled_validates_index() {
    let mut rig = Rig::new(FeederConfig::default());
    assert_eq!(
        rig.command(AppCommand::StartScheduled(7)),
        Err(Error::InvalidScheduleIndex(7))
    );
    assert!(!rig.app.controller().is_running());

    rig.command(AppCommand::StartScheduled(2)).unwrap();
    assert_eq!(
        rig.app.controller().run().map(|r| r.mode),
        Some(RunMode::Scheduled(2))
    );
}

// ── Manual trigger toggle ─────────────────────────────────────

#[test]
fn disabled_manual_trigger_ignores_presses_and_commands() {
    let mut rig = Rig::new(FeederConfig::default());
    rig.press();
    assert_eq!(rig.app.controller().idle_presses(), 1);

    rig.command(AppCommand::SetManualTrigger(false)).unwrap();
    assert_eq!(rig.app.controller().idle_presses(), 0);
    assert!(!rig.app.config().manual_trigger_enabled);
    assert!(rig.app.is_config_dirty());

    for _ in 0..5 {
        rig.press();
    }
    assert!(rig.hw.relay_calls.is_empty());
    assert_eq!(
        rig.command(AppCommand::StartManual),
        Err(Error::Rejected(Rejection::ManualDisabled))
    );
}

// ── Config hot-reload and persistence ─────────────────────────

#[test]
fn update_config_applies_live_and_auto_saves() {
    let mut rig = Rig::new(FeederConfig::default());
    let nvs = MockNvs::new();

    let new_cfg = FeederConfig {
        cooldown_ms: 0,
        manual_step_count: 2,
        ..FeederConfig::default()
    };
    rig.clock.set_ms(1_000);
    rig.command(AppCommand::UpdateConfig(new_cfg.clone())).unwrap();
    assert_eq!(rig.sink.events.last(), Some(&AppEvent::ConfigUpdated));
    assert!(rig.app.is_config_dirty());

    // New step count and zero cooldown take effect immediately.
    rig.command(AppCommand::StartManual).unwrap();
    assert_eq!(rig.app.controller().run().map(|r| r.steps_required), Some(2));
    rig.command(AppCommand::EmergencyStop).unwrap();
    rig.command(AppCommand::StartManual).unwrap();

    assert!(!rig.app.auto_save_if_needed(&nvs, 1_000 + AUTO_SAVE_DELAY_MS - 1));
    assert!(rig.app.auto_save_if_needed(&nvs, 1_000 + AUTO_SAVE_DELAY_MS));
    assert_eq!(nvs.saves.get(), 1);
    assert_eq!(nvs.stored.borrow().as_ref(), Some(&new_cfg));
    assert!(!rig.app.is_config_dirty());
    assert!(!rig.app.auto_save_if_needed(&nvs, 100_000));
}

#[test]
fn invalid_update_leaves_everything_untouched() {
    let mut rig = Rig::new(FeederConfig::default());
    let bad = FeederConfig {
        control_loop_interval_ms: 100,
        ..FeederConfig::default()
    };
    assert!(matches!(
        rig.command(AppCommand::UpdateConfig(bad)),
        Err(Error::Config(_))
    ));
    assert_eq!(rig.app.config(), &FeederConfig::default());
    assert!(!rig.app.is_config_dirty());
}

#[test]
fn save_config_flushes_immediately_and_failures_stay_dirty() {
    let mut rig = Rig::new(FeederConfig::default());
    let nvs = MockNvs::new();

    rig.clock.set_ms(20_000);
    rig.command(AppCommand::SaveConfig).unwrap();
    nvs.fail.set(true);
    assert!(!rig.app.auto_save_if_needed(&nvs, 20_000));
    assert!(rig.app.is_config_dirty());

    nvs.fail.set(false);
    rig.app.force_save_if_dirty(&nvs);
    assert!(!rig.app.is_config_dirty());
    assert_eq!(nvs.saves.get(), 1);
    assert_eq!(nvs.load(), Ok(FeederConfig::default()));
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn telemetry_counts_stops_by_reason() {
    let mut rig = Rig::new(FeederConfig {
        cooldown_ms: 0,
        ..FeederConfig::default()
    });

    rig.command(AppCommand::StartManual).unwrap();
    for _ in 0..3 {
        rig.press();
    }
    rig.command(AppCommand::StartManual).unwrap();
    rig.command(AppCommand::EmergencyStop).unwrap();
    rig.press();

    let t = rig.app.build_telemetry(rig.clock.monotonic_ms(), &rig.hw);
    assert_eq!(t.runs_completed, 1);
    assert_eq!(t.runs_emergency_stopped, 1);
    assert_eq!(t.runs_timed_out, 0);
    assert_eq!(t.idle_presses, 1);
    assert!(!t.running);
    assert!(!t.relay_active);

    let json = serde_json::to_string(&t).unwrap();
    assert!(json.contains("\"runs_completed\":1"));
}

#[test]
fn console_lines_drive_the_service() {
    let mut rig = Rig::new(FeederConfig::default());

    rig.command(parse_command("start").unwrap()).unwrap();
    assert!(rig.app.controller().is_running());
    rig.command(parse_command("stop").unwrap()).unwrap();
    assert!(!rig.app.controller().is_running());
    assert_eq!(rig.hw.relay_calls, vec![true, false]);

    // Syntax is fine; the range check happens in the service.
    let out_of_range = parse_command("slot 0 25:00 3").unwrap();
    assert!(matches!(rig.command(out_of_range), Err(Error::Config(_))));
    assert_eq!(
        rig.command(parse_command("run 7").unwrap()),
        Err(Error::InvalidScheduleIndex(7))
    );
}
