//! GPIO drivers for the switch and the motor relay.

pub mod debounce;
pub mod relay;
pub mod switch;
