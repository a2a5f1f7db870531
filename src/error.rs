//! Unified error types for the feeder firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the control
//! loop and the command handlers report failures uniformly.  All variants
//! are `Copy`; nothing here allocates.
//!
//! Refused run requests are *not* faults.  They surface as
//! [`Error::Rejected`] so the caller can see why, but the controller state
//! is untouched and the request is never retried automatically.

use core::fmt;

use crate::app::ports::ConfigError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A run start was refused by the controller.
    Rejected(Rejection),
    /// A schedule slot index outside the configured table.
    InvalidScheduleIndex(usize),
    /// Configuration is invalid or could not be loaded/stored.
    Config(&'static str),
    /// A console line that does not parse as a command.
    Command(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(r) => write!(f, "rejected: {r}"),
            Self::InvalidScheduleIndex(i) => write!(f, "schedule index {i} out of range"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Command(usage) => write!(f, "bad command: {usage}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Start rejections
// ---------------------------------------------------------------------------

/// Why the run controller refused to start a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Manual triggering is switched off in the configuration.
    ManualDisabled,
    /// Another run (manual or scheduled) already owns the relay.
    RunActive,
    /// The post-stop cooldown has not elapsed yet.
    CoolingDown { remaining_ms: u64 },
    /// A run must require at least one step.
    InvalidStepCount,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ManualDisabled => write!(f, "manual trigger disabled"),
            Self::RunActive => write!(f, "a run is already active"),
            Self::CoolingDown { remaining_ms } => {
                write!(f, "cooling down ({remaining_ms} ms remaining)")
            }
            Self::InvalidStepCount => write!(f, "step count must be at least 1"),
        }
    }
}

impl From<Rejection> for Error {
    fn from(r: Rejection) -> Self {
        Self::Rejected(r)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::NotFound => Self::Config("not found"),
            ConfigError::Corrupted => Self::Config("corrupted"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::IoError => Self::Config("I/O error"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
