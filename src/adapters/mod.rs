//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements          | Connects to                   |
//! |---------------|---------------------|-------------------------------|
//! | `hardware`    | SensorPort          | SCD-40 over I2C               |
//! |               | RelayPort           | Relay GPIO                    |
//! | `log_sink`    | EventSink           | Serial log output             |
//! | `time`        | ClockPort           | ESP32 system timer            |
//! | `ethernet`    | -                   | ESP-IDF EMAC + LAN8720 PHY    |
//! | `http_server` | -                   | ESP-IDF httpd → dashboard     |

#[cfg(target_os = "espidf")]
pub mod ethernet;
pub mod hardware;
#[cfg(target_os = "espidf")]
pub mod http_server;
pub mod log_sink;
pub mod time;
