//! Fuzz target: switch level / timing sequences through the control loop
//!
//! Each input byte is one loop iteration: bit 7 is the raw switch level,
//! the low bits are the milliseconds since the previous iteration.  Bytes
//! with bits 5–6 both set also inject an operator command.  After every
//! iteration the relay must be on exactly while a run exists, and no run
//! may count more steps than it requires.
//!
//! cargo fuzz run fuzz_switch_sequence

#![no_main]

use std::cell::Cell;

use feeder::app::commands::AppCommand;
use feeder::app::events::AppEvent;
use feeder::app::ports::{ClockPort, EventSink, RelayActuator, SwitchPort};
use feeder::app::service::AppService;
use feeder::config::FeederConfig;
use feeder::drivers::debounce::PinLevel;
use feeder::scheduler::WallClock;
use libfuzzer_sys::fuzz_target;

#[derive(Default)]
struct Bench {
    switch: PinLevel,
    relay: bool,
}

impl SwitchPort for Bench {
    fn read_switch(&mut self) -> PinLevel {
        self.switch
    }
}

impl RelayActuator for Bench {
    fn set_active(&mut self, active: bool) {
        self.relay = active;
    }

    fn is_active(&self) -> bool {
        self.relay
    }
}

#[derive(Default)]
struct Clock(Cell<u64>);

impl ClockPort for Clock {
    fn monotonic_ms(&self) -> u64 {
        self.0.get()
    }

    fn wall_clock(&self) -> Option<WallClock> {
        None
    }
}

struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let config = FeederConfig {
        cooldown_ms: 500,
        max_run_ms: 5_000,
        ..FeederConfig::default()
    };
    let mut app = AppService::new(config);
    let mut hw = Bench::default();
    let clock = Clock::default();
    let mut sink = NullSink;

    for &b in data {
        if b & 0x60 == 0x60 {
            let cmd = match b & 0x07 {
                0 | 1 => AppCommand::StartManual,
                2 => AppCommand::EmergencyStop,
                3 => AppCommand::SetManualTrigger(b & 0x08 != 0),
                _ => AppCommand::StartScheduled(usize::from(b & 0x03)),
            };
            let _ = app.handle_command(cmd, &mut hw, &clock, &mut sink);
        }

        hw.switch = PinLevel::from(b & 0x80 != 0);
        clock.0.set(clock.0.get() + u64::from(b & 0x7f));
        app.tick(&mut hw, &clock, &mut sink);

        assert_eq!(hw.relay, app.controller().is_running());
        if let Some(run) = app.controller().run() {
            assert!(run.steps_completed < run.steps_required);
            assert!(run.elapsed_ms(clock.0.get()) < 5_000);
        }
    }
});
