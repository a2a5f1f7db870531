//! Step switch input.
//!
//! Reads the raw (undebounced) level of the switch GPIO.  Debouncing is
//! the job of [`Debouncer`](super::debounce::Debouncer); this driver only
//! turns pin reads into [`PinLevel`]s and papers over read errors.

use embedded_hal::digital::InputPin;
use log::warn;

use super::debounce::PinLevel;

pub struct SwitchInput<P> {
    pin: P,
    last: PinLevel,
}

impl<P: InputPin> SwitchInput<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            last: PinLevel::Low,
        }
    }

    /// Sample the pin.  A failed read repeats the previous level so a bus
    /// glitch cannot fabricate an edge.
    pub fn read(&mut self) -> PinLevel {
        match self.pin.is_high() {
            Ok(high) => self.last = PinLevel::from(high),
            Err(e) => warn!("Switch: pin read failed ({:?}), holding {:?}", e, self.last),
        }
        self.last
    }
}
