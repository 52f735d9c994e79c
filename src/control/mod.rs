//! Control policies.  The fan is binary, so hysteresis is the only one.

pub mod hysteresis;

pub use hysteresis::{Decision, HysteresisController, RelayState, Sample, Thresholds};
