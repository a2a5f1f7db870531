//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! Telemetry goes out as one JSON object per line so a serial capture can
//! be parsed directly.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::fsm::StopReason;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => match serde_json::to_string(t) {
                Ok(json) => info!("TELEM | {}", json),
                Err(e) => warn!("TELEM | encode failed: {}", e),
            },
            AppEvent::Started => {
                info!("START | feeder controller up");
            }
            AppEvent::RunStarted {
                mode,
                steps_required,
            } => {
                info!("RUN   | start {:?}, {} steps", mode, steps_required);
            }
            AppEvent::RunStopped(report) => match report.reason {
                StopReason::Completed => info!(
                    "RUN   | stop {:?}: {} ({}/{} steps, {} ms)",
                    report.mode,
                    report.reason,
                    report.steps_completed,
                    report.steps_required,
                    report.duration_ms()
                ),
                StopReason::Timeout | StopReason::Emergency => warn!(
                    "RUN   | stop {:?}: {} ({}/{} steps, {} ms)",
                    report.mode,
                    report.reason,
                    report.steps_completed,
                    report.steps_required,
                    report.duration_ms()
                ),
            },
            AppEvent::ScheduleFired { index } => {
                info!("SCHED | slot {} fired", index);
            }
            AppEvent::StartRejected { source, reason } => {
                warn!("REJECT| {:?}: {}", source, reason);
            }
            AppEvent::ConfigUpdated => {
                info!("CONFIG| updated");
            }
        }
    }
}
