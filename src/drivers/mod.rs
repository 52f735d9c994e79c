//! Relay driver, hardware initialisation, and peripheral helpers.

pub mod hw_init;
#[cfg(target_os = "espidf")]
pub mod i2c;
pub mod relay;
pub mod watchdog;
