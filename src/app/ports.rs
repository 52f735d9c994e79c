//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ MeasurementScheduler (domain)
//! ```
//!
//! Driven adapters (sensor, relay, event sink, clock) implement these
//! traits.  The [`MeasurementScheduler`](crate::scheduler::MeasurementScheduler)
//! consumes them via generics, so the control loop never touches hardware
//! directly and runs unchanged against the mocks in `tests/`.

use crate::error::{ActuatorError, SensorError};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: one CO2 reading per call.
///
/// Implementations return `Err` for anything that must not drive the
/// relay: bus failures, CRC errors, data-not-ready and zero readings.
/// The scheduler turns `Err` into an invalid sample.
pub trait SensorPort {
    fn read_co2_ppm(&mut self) -> Result<u16, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Relay port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the fan relay.
pub trait RelayPort {
    /// Drive the relay coil.  `true` = fan running.
    fn set_relay(&mut self, energized: bool) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`ControllerEvent`](super::events::ControllerEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::ControllerEvent);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source plus a blocking delay.
pub trait ClockPort {
    /// Milliseconds since boot.  Never goes backwards.
    fn now_ms(&self) -> u64;

    /// Block the calling task for roughly `ms` milliseconds.
    fn sleep_ms(&mut self, ms: u64);
}
