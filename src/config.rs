//! System configuration parameters
//!
//! All tunable parameters for the feeder.  Values are loaded from NVS at
//! boot and can be replaced at runtime through
//! [`AppCommand::UpdateConfig`](crate::app::commands::AppCommand).

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::drivers::debounce::DEBOUNCE_MS;
use crate::drivers::relay::RelayPolarity;
use crate::safety::{COOLDOWN_MS, MAX_RUN_MS};

/// Maximum number of schedule slots (stack-allocated).
pub const MAX_SCHEDULES: usize = 8;

/// One configured daily feeding time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    /// Hour of day, 0–23.
    pub hour: u8,
    /// Minute, 0–59.
    pub minute: u8,
    /// Motor steps to run, at least 1.
    pub steps: u32,
}

const DEFAULT_SCHEDULE: [ScheduleSlot; 3] = [
    ScheduleSlot { hour: 8, minute: 0, steps: 3 },
    ScheduleSlot { hour: 12, minute: 0, steps: 3 },
    ScheduleSlot { hour: 18, minute: 0, steps: 3 },
];

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeederConfig {
    // --- Switch ---
    /// Settle time before a switch level change is accepted (ms)
    pub debounce_window_ms: u32,

    // --- Runs ---
    /// Lockout after any stop before a manual start is accepted (ms)
    pub cooldown_ms: u32,
    /// Failsafe ceiling on a single run (ms)
    pub max_run_ms: u32,
    /// Steps per manual run; also the arming presses needed to start one
    pub manual_step_count: u32,
    /// Whether switch presses and manual commands may start runs
    pub manual_trigger_enabled: bool,

    // --- Relay ---
    /// Pin level that energises the relay (read once at boot)
    pub relay_polarity: RelayPolarity,

    // --- Timing ---
    /// Control loop interval (milliseconds)
    pub control_loop_interval_ms: u32,
    /// Telemetry report interval (seconds)
    pub telemetry_interval_secs: u32,

    // --- Schedule ---
    /// Daily feeding times
    pub schedule: Vec<ScheduleSlot, MAX_SCHEDULES>,
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            debounce_window_ms: DEBOUNCE_MS as u32,

            cooldown_ms: COOLDOWN_MS as u32,
            max_run_ms: MAX_RUN_MS as u32,
            manual_step_count: 3,
            manual_trigger_enabled: true,

            relay_polarity: RelayPolarity::ActiveHigh,

            control_loop_interval_ms: 10, // 100 Hz switch sampling
            telemetry_interval_secs: 60,  // 1/min

            schedule: DEFAULT_SCHEDULE.iter().copied().collect(),
        }
    }
}

impl FeederConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(5..=1000).contains(&self.debounce_window_ms) {
            return Err(ConfigError::ValidationFailed(
                "debounce_window_ms must be 5–1000",
            ));
        }
        if self.cooldown_ms > 600_000 {
            return Err(ConfigError::ValidationFailed(
                "cooldown_ms must be 0–600000",
            ));
        }
        if !(1_000..=3_600_000).contains(&self.max_run_ms) {
            return Err(ConfigError::ValidationFailed(
                "max_run_ms must be 1000–3600000",
            ));
        }
        if !(1..=100).contains(&self.manual_step_count) {
            return Err(ConfigError::ValidationFailed(
                "manual_step_count must be 1–100",
            ));
        }
        if !(1..=1000).contains(&self.control_loop_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "control_loop_interval_ms must be 1–1000",
            ));
        }
        if self.control_loop_interval_ms >= self.debounce_window_ms {
            return Err(ConfigError::ValidationFailed(
                "control_loop_interval_ms must be shorter than debounce_window_ms",
            ));
        }
        if !(5..=3600).contains(&self.telemetry_interval_secs) {
            return Err(ConfigError::ValidationFailed(
                "telemetry_interval_secs must be 5–3600",
            ));
        }
        self.schedule.iter().try_for_each(validate_slot)
    }
}

/// Range-check a single schedule slot.
pub fn validate_slot(slot: &ScheduleSlot) -> Result<(), ConfigError> {
    if slot.hour > 23 {
        return Err(ConfigError::ValidationFailed("schedule hour must be 0–23"));
    }
    if slot.minute > 59 {
        return Err(ConfigError::ValidationFailed("schedule minute must be 0–59"));
    }
    if !(1..=100).contains(&slot.steps) {
        return Err(ConfigError::ValidationFailed("schedule steps must be 1–100"));
    }
    Ok(())
}
