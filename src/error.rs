//! Unified error types for the Co2Fan firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the boot
//! path and the control loop handle failures uniformly.  All variants are
//! `Copy` so they travel through events and snapshots without allocation.
//!
//! | Variant   | Recovery                                              |
//! |-----------|-------------------------------------------------------|
//! | `Sensor`  | transient: relay held, snapshot flagged                |
//! | `Actuator`| transient: superseded by the next cycle's decision     |
//! | `Config`  | fatal at boot: the control loop never starts           |
//! | `Network` | non-fatal: only the dashboard becomes unreachable      |

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The CO2 sensor could not be read or returned unusable data.
    Sensor(SensorError),
    /// The relay write failed.
    Actuator(ActuatorError),
    /// The boot configuration is invalid.
    Config(ConfigError),
    /// Ethernet or the dashboard server is unavailable.
    Network(NetworkError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Network(e) => write!(f, "network: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The I2C transaction failed or timed out.
    BusFailed,
    /// A received word failed its CRC-8 check.
    CrcMismatch,
    /// No new measurement is available yet.
    NotReady,
    /// The sensor reported a physically implausible value.
    OutOfRange(u16),
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusFailed => write!(f, "I2C transaction failed"),
            Self::CrcMismatch => write!(f, "CRC mismatch"),
            Self::NotReady => write!(f, "measurement not ready"),
            Self::OutOfRange(ppm) => write!(f, "reading out of range ({ppm} ppm)"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO set failed; carries the ESP-IDF return code.
    GpioWriteFailed(i32),
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed(rc) => write!(f, "GPIO write failed (rc={rc})"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Boot configuration rejected.  The `&'static str` payloads name the
/// offending field so the boot log points straight at `config.rs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A threshold is zero.
    ZeroThreshold,
    /// `off_ppm` is not strictly below `on_ppm`.
    InvertedThresholds { on_ppm: u16, off_ppm: u16 },
    /// `measurement_interval_ms` is zero.
    ZeroInterval,
    /// The HTTP port is zero.
    ZeroPort,
    /// Some but not all static addressing fields are set.
    IncompleteStaticNetwork(&'static str),
    /// A static addressing field is not a dotted-quad IPv4 address.
    MalformedAddress(&'static str),
    /// The subnet mask is not a contiguous run of leading ones.
    InvalidSubnetMask,
    /// The gateway or IP lies outside the configured subnet.
    GatewayOutsideSubnet,
    /// A credential field is empty, too long or has illegal characters.
    InvalidCredentials(&'static str),
    /// A GPIO number is out of range or not usable in the required direction.
    InvalidPin(&'static str),
    /// Two functions are assigned to the same GPIO.
    PinConflict(i32),
    /// A build-time override could not be parsed.
    MalformedOverride(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroThreshold => write!(f, "thresholds must be positive"),
            Self::InvertedThresholds { on_ppm, off_ppm } => write!(
                f,
                "off threshold ({off_ppm} ppm) must be below on threshold ({on_ppm} ppm)"
            ),
            Self::ZeroInterval => write!(f, "measurement interval must be positive"),
            Self::ZeroPort => write!(f, "HTTP port must be positive"),
            Self::IncompleteStaticNetwork(field) => {
                write!(f, "static network configuration incomplete: {field} missing")
            }
            Self::MalformedAddress(field) => write!(f, "{field} is not a valid IPv4 address"),
            Self::InvalidSubnetMask => write!(f, "subnet mask is not contiguous"),
            Self::GatewayOutsideSubnet => write!(f, "gateway is outside the configured subnet"),
            Self::InvalidCredentials(field) => write!(f, "invalid dashboard {field}"),
            Self::InvalidPin(name) => write!(f, "invalid GPIO for {name}"),
            Self::PinConflict(pin) => write!(f, "GPIO {pin} assigned more than once"),
            Self::MalformedOverride(key) => write!(f, "build override {key} is malformed"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Network errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    /// The Ethernet MAC/PHY driver failed to initialise.
    EthInitFailed,
    /// The network interface could not be configured.
    NetifFailed,
    /// The dashboard HTTP server failed to start.
    HttpServerFailed,
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EthInitFailed => write!(f, "Ethernet init failed"),
            Self::NetifFailed => write!(f, "network interface setup failed"),
            Self::HttpServerFailed => write!(f, "HTTP server start failed"),
        }
    }
}

impl From<NetworkError> for Error {
    fn from(e: NetworkError) -> Self {
        Self::Network(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
