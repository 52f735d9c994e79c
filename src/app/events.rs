//! Outbound controller events.
//!
//! The [`MeasurementScheduler`](crate::scheduler::MeasurementScheduler)
//! emits these through the [`EventSink`](super::ports::EventSink) port.
//! Transition-style events (`*Fault` / `*Recovered`) fire once per edge,
//! not once per cycle, so a sensor that stays unplugged does not flood
//! the log.

use crate::control::{RelayState, Thresholds};
use crate::error::{ActuatorError, SensorError};
use crate::status::StatusSnapshot;

/// Structured events emitted by the control loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// The scheduler has started.
    Started {
        thresholds: Thresholds,
        interval_ms: u64,
    },

    /// The controller changed the commanded relay state.
    RelaySwitched {
        from: RelayState,
        to: RelayState,
        ppm: u16,
    },

    /// The sensor started failing; the relay is being held.
    SensorFault(SensorError),

    /// A valid reading arrived after one or more failures.
    SensorRecovered { ppm: u16 },

    /// Writing the relay failed.  The commanded state is unchanged.
    ActuatorFault {
        target: RelayState,
        error: ActuatorError,
    },

    /// A relay write succeeded after a failure.
    ActuatorRecovered(RelayState),

    /// End-of-cycle snapshot.
    Telemetry(StatusSnapshot),
}
