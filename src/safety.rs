//! Safety timing for the motor relay.
//!
//! Two guards bound how the relay may be driven:
//!
//! 1. **Cooldown**: after *any* stop, a manual start is refused until
//!    `cooldown_ms` has elapsed, so trigger chatter cannot immediately
//!    re-energise the mechanism.
//! 2. **Failsafe ceiling**: a run that has been active for `max_run_ms`
//!    is stopped regardless of step count.  A stuck switch that never
//!    delivers its edges therefore cannot leave the motor running.
//!
//! Both are pure arithmetic on monotonic milliseconds; the
//! [`RunController`](crate::fsm::RunController) owns one [`Cooldown`] and
//! one [`Failsafe`] and consults them on every request and tick.

use crate::error::Rejection;

/// Default post-stop lockout for manual starts.
pub const COOLDOWN_MS: u64 = 3_000;
/// Default ceiling on a single run.
pub const MAX_RUN_MS: u64 = 60_000;

/// Tracks the time of the most recent stop.
#[derive(Debug, Clone, Copy)]
pub struct Cooldown {
    window_ms: u64,
    /// `None` until the first stop after boot.
    last_stop_ms: Option<u64>,
}

impl Cooldown {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            last_stop_ms: None,
        }
    }

    /// Record a stop at `now_ms`.
    pub fn record_stop(&mut self, now_ms: u64) {
        self.last_stop_ms = Some(now_ms);
    }

    /// Milliseconds left before a manual start is allowed (0 = clear).
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        match self.last_stop_ms {
            Some(stop) => self
                .window_ms
                .saturating_sub(now_ms.saturating_sub(stop)),
            None => 0,
        }
    }

    /// `Ok` once at least `window_ms` has passed since the last stop.
    pub fn check(&self, now_ms: u64) -> Result<(), Rejection> {
        match self.remaining_ms(now_ms) {
            0 => Ok(()),
            remaining_ms => Err(Rejection::CoolingDown { remaining_ms }),
        }
    }

    pub fn set_window_ms(&mut self, window_ms: u64) {
        self.window_ms = window_ms;
    }
}

/// Maximum-run-duration guard.
#[derive(Debug, Clone, Copy)]
pub struct Failsafe {
    max_run_ms: u64,
}

impl Failsafe {
    pub fn new(max_run_ms: u64) -> Self {
        Self { max_run_ms }
    }

    /// True when a run started at `start_ms` has hit the ceiling.
    pub fn expired(&self, start_ms: u64, now_ms: u64) -> bool {
        now_ms.saturating_sub(start_ms) >= self.max_run_ms
    }

    pub fn set_max_run_ms(&mut self, max_run_ms: u64) {
        self.max_run_ms = max_run_ms;
    }
}
