//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (serial console,
//! a future network link, the board's own main loop) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.

use crate::config::FeederConfig;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Start a manual run, subject to the manual-trigger flag and cooldown.
    StartManual,

    /// Run schedule slot `index` now, outside its configured time.
    StartScheduled(usize),

    /// Stop any active run immediately.  No-op when idle.
    EmergencyStop,

    /// Enable or disable manual triggering.
    SetManualTrigger(bool),

    /// Enable or disable the wall-clock scheduler.
    SetSchedulerEnabled(bool),

    /// Re-time one schedule slot.
    SetScheduleEntry {
        index: usize,
        hour: u8,
        minute: u8,
        steps: u32,
    },

    /// Hot-reload configuration.
    UpdateConfig(FeederConfig),

    /// Persist the current config on the next auto-save check.
    SaveConfig,
}
