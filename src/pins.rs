//! GPIO pin assignments for the feeder controller board (ESP32 D1 mini).
//!
//! Single source of truth: the binary and the drivers reference this
//! module rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Step switch
// ---------------------------------------------------------------------------

/// Step/press switch input.  Wired to 3.3 V when closed; the internal
/// pull-down holds the pin LOW while open, so HIGH = closed.
pub const SWITCH_GPIO: i32 = 32;

// ---------------------------------------------------------------------------
// Motor relay
// ---------------------------------------------------------------------------

/// Relay coil driver output.  Shares the on-board LED on most D1 mini
/// boards, which doubles as a "motor running" indicator.
/// Active level is set by `FeederConfig::relay_polarity`, never here.
pub const RELAY_GPIO: i32 = 2;
