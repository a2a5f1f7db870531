//! Hardware adapter. Bridges real peripherals to domain port traits.
//!
//! Owns the switch input and the relay driver, exposing them through
//! [`SwitchPort`] and [`RelayActuator`].  This is the only module in the
//! system that touches actual GPIO.  Both drivers are generic over
//! `embedded-hal` pins, so on host tests the adapter wraps mock pins.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::{RelayActuator, SwitchPort};
use crate::drivers::debounce::PinLevel;
use crate::drivers::relay::RelayDriver;
use crate::drivers::switch::SwitchInput;

/// Concrete adapter that combines the feeder's two GPIOs behind port traits.
pub struct HardwareAdapter<I, O> {
    switch: SwitchInput<I>,
    relay: RelayDriver<O>,
}

impl<I: InputPin, O: OutputPin> HardwareAdapter<I, O> {
    pub fn new(switch: SwitchInput<I>, relay: RelayDriver<O>) -> Self {
        Self { switch, relay }
    }
}

// ── SwitchPort implementation ─────────────────────────────────

impl<I: InputPin, O: OutputPin> SwitchPort for HardwareAdapter<I, O> {
    fn read_switch(&mut self) -> PinLevel {
        self.switch.read()
    }
}

// ── RelayActuator implementation ──────────────────────────────

impl<I: InputPin, O: OutputPin> RelayActuator for HardwareAdapter<I, O> {
    fn set_active(&mut self, active: bool) {
        self.relay.set_active(active);
    }

    fn is_active(&self) -> bool {
        self.relay.is_active()
    }
}
