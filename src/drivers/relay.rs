//! Motor relay driver.
//!
//! A single digital output drives the relay coil (or its transistor stage).
//! Whether "active" means a HIGH or LOW pin level depends on the board, so
//! the mapping is a [`RelayPolarity`] fixed when the driver is built and
//! never consulted anywhere else.
//!
//! ## Dual-target design
//!
//! Generic over `embedded_hal::digital::OutputPin`: on ESP-IDF this is an
//! `esp_idf_hal::gpio::PinDriver`, on host tests a recording mock pin.

use embedded_hal::digital::OutputPin;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::app::ports::RelayActuator;

/// Pin level that energises the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RelayPolarity {
    /// Pin HIGH = relay on.
    #[default]
    ActiveHigh,
    /// Pin LOW = relay on (typical opto-isolated relay modules).
    ActiveLow,
}

impl RelayPolarity {
    /// Pin level (`true` = HIGH) for the requested relay state.
    pub const fn pin_level(self, active: bool) -> bool {
        match self {
            Self::ActiveHigh => active,
            Self::ActiveLow => !active,
        }
    }
}

pub struct RelayDriver<P> {
    pin: P,
    polarity: RelayPolarity,
    active: bool,
}

impl<P: OutputPin> RelayDriver<P> {
    /// Take ownership of the output pin and drive it to the inactive level.
    pub fn new(pin: P, polarity: RelayPolarity) -> Self {
        let mut relay = Self {
            pin,
            polarity,
            active: false,
        };
        relay.write_pin(false);
        relay
    }

    fn write_pin(&mut self, active: bool) {
        let result = if self.polarity.pin_level(active) {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        if let Err(e) = result {
            warn!("Relay: pin write failed ({:?})", e);
        }
    }
}

impl<P: OutputPin> RelayActuator for RelayDriver<P> {
    fn set_active(&mut self, active: bool) {
        self.write_pin(active);
        self.active = active;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
