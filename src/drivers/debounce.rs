//! Time-window switch debouncer with rising-edge detection.
//!
//! ## Algorithm
//!
//! Every raw level change restarts the settle timer.  Once the raw level
//! has held for *longer* than the debounce window and differs from the
//! committed stable level, it becomes the new stable level.  A commit to
//! `High` is reported as a single [`EdgeEvent::RisingEdge`]; commits to
//! `Low` are silent.
//!
//! Contact bounce shorter than the window never reaches the stable level,
//! so one physical press held longer than the window yields exactly one
//! rising edge.
//!
//! The debouncer is a pure function of its own state and the inputs:
//! no I/O, no blocking.  Call [`Debouncer::poll`] once per control tick.

/// Default settle time before a raw level change is accepted.
pub const DEBOUNCE_MS: u64 = 50;

/// Binary logic level of a digital input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PinLevel {
    #[default]
    Low,
    High,
}

impl PinLevel {
    pub fn is_high(self) -> bool {
        matches!(self, Self::High)
    }
}

impl From<bool> for PinLevel {
    fn from(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }
}

/// Result of one debouncer poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeEvent {
    None,
    RisingEdge,
}

pub struct Debouncer {
    window_ms: u64,
    last_raw: PinLevel,
    stable: PinLevel,
    last_change_ms: u64,
}

impl Debouncer {
    /// Create a debouncer that starts with a stable `Low` level.
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            last_raw: PinLevel::Low,
            stable: PinLevel::Low,
            last_change_ms: 0,
        }
    }

    /// Feed one raw sample taken at monotonic time `now_ms`.
    pub fn poll(&mut self, raw: PinLevel, now_ms: u64) -> EdgeEvent {
        if raw != self.last_raw {
            self.last_raw = raw;
            self.last_change_ms = now_ms;
        }

        let settled = now_ms.saturating_sub(self.last_change_ms) > self.window_ms;
        if settled && raw != self.stable {
            self.stable = raw;
            if raw.is_high() {
                return EdgeEvent::RisingEdge;
            }
        }

        EdgeEvent::None
    }

    /// Last committed (debounced) level.
    pub fn stable_level(&self) -> PinLevel {
        self.stable
    }

    /// Change the settle window.  The current stable level is kept.
    pub fn set_window_ms(&mut self, window_ms: u64) {
        self.window_ms = window_ms;
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEBOUNCE_MS)
    }
}
