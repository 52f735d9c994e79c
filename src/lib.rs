//! Co2Fan firmware library.
//!
//! Exposes the control core, dashboard and drivers for the firmware
//! binary and for host-side testing.  All ESP-IDF-specific code is
//! guarded by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

// The ESP-IDF glue needs the optional `esp-idf-*` crates.
#[cfg(all(target_os = "espidf", not(feature = "espidf")))]
compile_error!("building for target_os = \"espidf\" requires `--features espidf`");

pub mod app;
pub mod config;
pub mod control;
pub mod dashboard;
pub mod error;
pub mod network;
pub mod pins;
pub mod scheduler;
pub mod status;

// Hardware-facing modules.  On host targets their ESP-IDF paths are
// replaced by simulation stubs.
pub mod adapters;
pub mod drivers;
pub mod sensors;
