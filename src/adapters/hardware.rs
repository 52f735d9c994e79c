//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the SCD-40 driver and the relay driver, exposing them through
//! [`SensorPort`] and [`RelayPort`].  This is the only module the
//! scheduler reaches hardware through.  On non-espidf targets the relay
//! driver uses its simulation stub and the sensor runs on whatever
//! `embedded_hal` bus it was given.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::app::ports::{RelayPort, SensorPort};
use crate::drivers::relay::RelayDriver;
use crate::error::{ActuatorError, SensorError};
use crate::sensors::Scd40;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<I, D> {
    sensor: Scd40<I, D>,
    relay: RelayDriver,
}

impl<I, D> HardwareAdapter<I, D> {
    pub fn new(sensor: Scd40<I, D>, relay: RelayDriver) -> Self {
        Self { sensor, relay }
    }

    pub fn relay(&self) -> &RelayDriver {
        &self.relay
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<I: I2c, D: DelayNs> SensorPort for HardwareAdapter<I, D> {
    fn read_co2_ppm(&mut self) -> Result<u16, SensorError> {
        self.sensor.read_co2_ppm()
    }
}

// ── RelayPort implementation ──────────────────────────────────

impl<I, D> RelayPort for HardwareAdapter<I, D> {
    fn set_relay(&mut self, energized: bool) -> Result<(), ActuatorError> {
        self.relay.set(energized)
    }
}
