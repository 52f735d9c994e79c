//! Sensor drivers.  The SCD-40 is the only sensor on the board.

pub mod scd40;

pub use scd40::{Measurement, Scd40};
