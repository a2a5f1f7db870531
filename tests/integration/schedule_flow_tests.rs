//! Integration tests for the wall clock → Scheduler → RunController path.

use crate::mock_hw::{ManualClock, MockHardware, RecordingSink};

use feeder::app::commands::AppCommand;
use feeder::app::events::{AppEvent, StartSource};
use feeder::app::service::AppService;
use feeder::config::{FeederConfig, ScheduleSlot};
use feeder::error::{Error, Rejection};
use feeder::fsm::{RunMode, StopReason};

struct Rig {
    app: AppService,
    hw: MockHardware,
    clock: ManualClock,
    sink: RecordingSink,
}

impl Rig {
    fn new() -> Self {
        Self::with_config(FeederConfig::default())
    }

    fn with_config(config: FeederConfig) -> Self {
        let mut app = AppService::new(config);
        let mut sink = RecordingSink::new();
        app.start(&mut sink);
        sink.clear();
        Self {
            app,
            hw: MockHardware::new(),
            clock: ManualClock::new(),
            sink,
        }
    }

    /// Tick `n` times, 10 ms apart, at the current wall clock.
    fn ticks(&mut self, n: usize) {
        for _ in 0..n {
            self.clock.advance(10);
            self.app.tick(&mut self.hw, &self.clock, &mut self.sink);
        }
    }

    fn at(&mut self, hour: u8, minute: u8, day: u16) {
        self.clock.set_wall(hour, minute, day);
        self.ticks(1);
    }

    fn command(&mut self, cmd: AppCommand) -> Result<(), Error> {
        self.app
            .handle_command(cmd, &mut self.hw, &self.clock, &mut self.sink)
    }

    fn fired(&self) -> Vec<usize> {
        self.sink
            .events
            .iter()
            .filter_map(|e| match e {
                AppEvent::ScheduleFired { index } => Some(*index),
                _ => None,
            })
            .collect()
    }
}

#[test]
fn slot_fires_once_per_minute_and_runs() {
    let mut rig = Rig::new();
    rig.at(7, 59, 10);
    assert!(rig.fired().is_empty());

    rig.at(8, 0, 10);
    rig.ticks(500);
    assert_eq!(rig.fired(), vec![0]);
    assert!(rig.sink.events.contains(&AppEvent::RunStarted {
        mode: RunMode::Scheduled(0),
        steps_required: 3
    }));
    assert_eq!(rig.hw.relay_calls, vec![true]);

    for _ in 0..3 {
        rig.hw.press();
        rig.ticks(8);
        rig.hw.release();
        rig.ticks(8);
    }
    assert_eq!(rig.hw.relay_calls, vec![true, false]);
    assert_eq!(rig.fired(), vec![0]);
}

#[test]
fn slot_fires_again_the_next_day() {
    let mut rig = Rig::new();
    rig.at(8, 0, 10);
    rig.command(AppCommand::EmergencyStop).unwrap();
    rig.at(8, 1, 10);
    rig.at(8, 0, 11);
    assert_eq!(rig.fired(), vec![0, 0]);
}

#[test]
fn clock_stepping_back_does_not_refire() {
    let mut rig = Rig::new();
    rig.at(12, 0, 40);
    rig.command(AppCommand::EmergencyStop).unwrap();
    rig.at(12, 1, 40);
    rig.at(12, 0, 40);
    assert_eq!(rig.fired(), vec![1]);
}

#[test]
fn slot_due_during_manual_run_is_forfeited_for_the_day() {
    let mut rig = Rig::new();
    rig.command(AppCommand::StartManual).unwrap();

    rig.at(12, 0, 10);
    assert_eq!(rig.fired(), vec![1]);
    assert!(rig.sink.events.contains(&AppEvent::StartRejected {
        source: StartSource::Schedule(1),
        reason: Rejection::RunActive
    }));
    assert_eq!(
        rig.app.controller().run().map(|r| r.mode),
        Some(RunMode::Manual)
    );

    rig.command(AppCommand::EmergencyStop).unwrap();
    rig.at(12, 1, 10);
    rig.at(12, 0, 10);
    assert!(!rig.app.controller().is_running());
    assert_eq!(rig.app.scheduler().entries()[1].last_triggered_day, Some(10));

    rig.at(12, 0, 11);
    assert_eq!(
        rig.app.controller().run().map(|r| r.mode),
        Some(RunMode::Scheduled(1))
    );
}

#[test]
fn scheduled_run_ignores_manual_cooldown() {
    let mut rig = Rig::with_config(FeederConfig {
        cooldown_ms: 600_000,
        ..FeederConfig::default()
    });
    rig.command(AppCommand::StartManual).unwrap();
    rig.command(AppCommand::EmergencyStop).unwrap();

    rig.at(18, 0, 3);
    assert_eq!(
        rig.app.controller().run().map(|r| r.mode),
        Some(RunMode::Scheduled(2))
    );
}

#[test]
fn missing_wall_clock_pauses_scheduling() {
    let mut rig = Rig::new();
    rig.ticks(1_000);
    assert!(rig.fired().is_empty());
    assert!(rig.app.scheduler().entries().iter().all(|e| e.last_triggered_day.is_none()));

    rig.at(8, 0, 1);
    rig.clock.clear_wall();
    rig.ticks(10);
    assert_eq!(rig.fired(), vec![0]);
}

#[test]
fn retimed_slot_can_fire_the_same_day() {
    let mut rig = Rig::new();
    rig.at(8, 0, 10);
    rig.command(AppCommand::EmergencyStop).unwrap();

    rig.command(AppCommand::SetScheduleEntry {
        index: 0,
        hour: 8,
        minute: 5,
        steps: 4,
    })
    .unwrap();
    assert_eq!(
        rig.app.config().schedule[0],
        ScheduleSlot {
            hour: 8,
            minute: 5,
            steps: 4
        }
    );
    assert!(rig.app.is_config_dirty());

    rig.at(8, 5, 10);
    assert_eq!(rig.fired(), vec![0, 0]);
    assert_eq!(rig.app.controller().run().map(|r| r.steps_required), Some(4));
}

#[test]
fn slot_retimed_to_the_current_minute_fires() {
    let mut rig = Rig::new();
    rig.at(9, 5, 10);
    rig.command(AppCommand::SetScheduleEntry {
        index: 1,
        hour: 9,
        minute: 5,
        steps: 2,
    })
    .unwrap();

    rig.ticks(100);
    assert_eq!(rig.fired(), vec![1]);
    assert_eq!(rig.app.controller().run().map(|r| r.steps_required), Some(2));
}

#[test]
fn whole_hour_clock_jump_does_not_skip_a_slot() {
    let mut rig = Rig::new();
    // Local timezone applied after SNTP sync moves 07:00 to 08:00.
    rig.at(7, 0, 10);
    rig.at(8, 0, 10);
    rig.ticks(100);
    assert_eq!(rig.fired(), vec![0]);
}

#[test]
fn set_schedule_entry_rejects_bad_input() {
    let mut rig = Rig::new();
    assert_eq!(
        rig.command(AppCommand::SetScheduleEntry {
            index: 3,
            hour: 8,
            minute: 0,
            steps: 1,
        }),
        Err(Error::InvalidScheduleIndex(3))
    );
    assert!(matches!(
        rig.command(AppCommand::SetScheduleEntry {
            index: 0,
            hour: 25,
            minute: 0,
            steps: 1,
        }),
        Err(Error::Config(_))
    ));
    assert_eq!(rig.app.config(), &FeederConfig::default());
    assert!(!rig.app.is_config_dirty());
}

#[test]
fn disabled_scheduler_resumes_within_the_same_minute() {
    let mut rig = Rig::new();
    rig.command(AppCommand::SetSchedulerEnabled(false)).unwrap();
    rig.at(8, 0, 10);
    assert!(rig.fired().is_empty());

    rig.command(AppCommand::SetSchedulerEnabled(true)).unwrap();
    rig.ticks(1);
    assert_eq!(rig.fired(), vec![0]);
}

#[test]
fn config_reload_keeps_fire_guards_unless_table_changes() {
    let mut rig = Rig::new();
    rig.at(8, 0, 10);
    rig.command(AppCommand::EmergencyStop).unwrap();

    let same_table = FeederConfig {
        max_run_ms: 30_000,
        ..FeederConfig::default()
    };
    rig.command(AppCommand::UpdateConfig(same_table)).unwrap();
    rig.at(8, 1, 10);
    rig.at(8, 0, 10);
    assert_eq!(rig.fired(), vec![0]);

    let mut new_table = FeederConfig {
        max_run_ms: 30_000,
        ..FeederConfig::default()
    };
    new_table.schedule[0].minute = 2;
    rig.command(AppCommand::UpdateConfig(new_table)).unwrap();
    rig.at(8, 2, 10);
    assert_eq!(rig.fired(), vec![0, 0]);

    // The reloaded 30 s ceiling applies to the new run.
    rig.ticks(2_999);
    assert!(rig.app.controller().is_running());
    rig.ticks(1);
    assert_eq!(
        rig.sink.events.last().and_then(|e| match e {
            AppEvent::RunStopped(r) => Some(r.reason),
            _ => None,
        }),
        Some(StopReason::Timeout)
    );
}
