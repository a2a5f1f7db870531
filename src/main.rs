//! Feeder Firmware: Main Entry Point
//!
//! Hexagonal architecture with a single cooperative control loop.  Operator
//! commands arrive as lines on the UART console (see
//! [`feeder::adapters::console`]) and are applied between ticks.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter  LogEventSink  NvsAdapter  Esp32Time  Console │
//! │  (Switch + Relay) (EventSink)   (Config)    (Clock)    (Cmds)  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Debouncer · RunController · Scheduler                 │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, PinDriver, Pull};
use log::{info, warn};

use feeder::adapters::console;
use feeder::adapters::hardware::HardwareAdapter;
use feeder::adapters::log_sink::LogEventSink;
use feeder::adapters::nvs::NvsAdapter;
use feeder::adapters::time::Esp32TimeAdapter;
use feeder::app::events::AppEvent;
use feeder::app::ports::{ClockPort, ConfigPort, ConfigError, EventSink};
use feeder::app::service::AppService;
use feeder::config::FeederConfig;
use feeder::drivers::relay::RelayDriver;
use feeder::drivers::switch::SwitchInput;
use feeder::pins;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Feeder v{}                          ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = NvsAdapter::new().map_err(|e| anyhow::anyhow!("NVS init failed: {}", e))?;
    let config = match nvs.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(ConfigError::NotFound) => {
            info!("No stored config, using defaults");
            FeederConfig::default()
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            FeederConfig::default()
        }
    };

    // ── 3. GPIO ───────────────────────────────────────────────
    // SAFETY: each pin number is claimed exactly once, here, and pins.rs
    // assigns them to nothing else.
    let mut switch_pin = PinDriver::input(unsafe { AnyIOPin::new(pins::SWITCH_GPIO) })?;
    switch_pin.set_pull(Pull::Down)?;
    let relay_pin = PinDriver::output(unsafe { AnyOutputPin::new(pins::RELAY_GPIO) })?;

    // Polarity is fixed here for the lifetime of the process.
    let mut hw = HardwareAdapter::new(
        SwitchInput::new(switch_pin),
        RelayDriver::new(relay_pin, config.relay_polarity),
    );
    info!(
        "GPIO: switch={} relay={} ({:?})",
        pins::SWITCH_GPIO,
        pins::RELAY_GPIO,
        config.relay_polarity
    );

    // ── 4. Construct app service ──────────────────────────────
    let clock = Esp32TimeAdapter::new();
    let mut log_sink = LogEventSink::new();
    let mut app = AppService::new(config);
    app.start(&mut log_sink);

    console::spawn_reader()?;
    info!("System ready. Entering control loop.");

    // ── 5. Control loop ───────────────────────────────────────
    let mut next_telemetry_ms = clock.monotonic_ms();

    loop {
        while let Some(cmd) = console::try_recv_command() {
            if let Err(e) = app.handle_command(cmd, &mut hw, &clock, &mut log_sink) {
                warn!("Command not applied: {}", e);
            }
        }

        app.tick(&mut hw, &clock, &mut log_sink);

        let now = clock.monotonic_ms();
        if now >= next_telemetry_ms {
            log_sink.emit(&AppEvent::Telemetry(app.build_telemetry(now, &hw)));
            next_telemetry_ms = now + u64::from(app.config().telemetry_interval_secs) * 1_000;
        }

        // Config auto-save (5s after the first unsaved change).
        app.auto_save_if_needed(&nvs, now);

        FreeRtos::delay_ms(app.config().control_loop_interval_ms);
    }
}
