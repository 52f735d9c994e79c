//! Fan relay driver (single GPIO, active HIGH).
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the relay GPIO configured by `hw_init`.
//! On host/test: tracks state in-memory only.

use log::{debug, warn};

use crate::drivers::hw_init;
use crate::error::ActuatorError;

pub struct RelayDriver {
    pin: i32,
    energized: bool,
}

impl RelayDriver {
    /// `hw_init` has already driven the pin LOW.
    pub fn new(pin: i32) -> Self {
        Self {
            pin,
            energized: false,
        }
    }

    /// Idempotent: writing the current level again is harmless.
    pub fn set(&mut self, energized: bool) -> Result<(), ActuatorError> {
        if let Err(rc) = hw_init::gpio_write(self.pin, energized) {
            warn!("Relay: GPIO{} write failed (rc={})", self.pin, rc);
            return Err(ActuatorError::GpioWriteFailed(rc));
        }
        if energized != self.energized {
            debug!("Relay: GPIO{} -> {}", self.pin, if energized { "HIGH" } else { "LOW" });
        }
        self.energized = energized;
        Ok(())
    }

    /// Last level successfully written.
    pub fn is_energized(&self) -> bool {
        self.energized
    }
}
