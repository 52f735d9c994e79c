//! System configuration parameters
//!
//! [`SystemConfig`] is the raw, editable surface: factory defaults plus
//! optional build-time overrides (`CO2FAN_*` environment variables seen by
//! `cargo build`).  [`SystemConfig::validate`] turns it into an immutable
//! [`DeviceConfig`] or rejects it; the firmware never runs on an
//! unvalidated configuration.

use log::warn;
use serde::Serialize;

use crate::control::Thresholds;
use crate::error::ConfigError;
use crate::network::NetworkSettings;
use crate::pins;

/// Factory dashboard password.  Accepted, but logged loudly at boot.
pub const DEFAULT_PASSWORD: &str = "changeme";

pub const MAX_USERNAME_LEN: usize = 32;
pub const MAX_PASSWORD_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Ethernet PHY parameters
// ---------------------------------------------------------------------------

/// Source of the 50 MHz RMII reference clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EthClockMode {
    /// External oscillator into GPIO0.
    Gpio0In,
    /// APLL clock out on GPIO0.
    Gpio0Out,
    /// APLL clock out on GPIO16.
    Gpio16Out,
    /// Inverted APLL clock out on GPIO17 (ESP32-POE-ISO).
    Gpio17Out,
}

impl EthClockMode {
    pub fn gpio(self) -> i32 {
        match self {
            Self::Gpio0In | Self::Gpio0Out => 0,
            Self::Gpio16Out => 16,
            Self::Gpio17Out => 17,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PhyChip {
    Lan8720,
    Ip101,
    Rtl8201,
    Dp83848,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EthConfig {
    pub clock: EthClockMode,
    /// PHY power enable; `None` if the PHY is always powered.
    pub power_pin: Option<i32>,
    pub phy: PhyChip,
    pub phy_addr: u8,
    pub mdc_pin: i32,
    pub mdio_pin: i32,
}

/// Pin assignments.  Immutable once validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HardwareConfig {
    pub i2c_sda_pin: i32,
    pub i2c_scl_pin: i32,
    pub relay_pin: i32,
    pub eth: EthConfig,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            i2c_sda_pin: pins::I2C_SDA_GPIO,
            i2c_scl_pin: pins::I2C_SCL_GPIO,
            relay_pin: pins::RELAY_GPIO,
            eth: EthConfig {
                clock: EthClockMode::Gpio17Out,
                power_pin: Some(pins::ETH_POWER_GPIO),
                phy: PhyChip::Lan8720,
                phy_addr: pins::ETH_PHY_ADDR,
                mdc_pin: pins::ETH_MDC_GPIO,
                mdio_pin: pins::ETH_MDIO_GPIO,
            },
        }
    }
}

impl HardwareConfig {
    /// Range, direction, reservation and uniqueness checks over every
    /// assigned GPIO.
    /// Every function here drives its line at some point (I2C and MDIO are
    /// open-drain/bidirectional), so input-only GPIOs are never allowed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut assigned: heapless::Vec<(&'static str, i32), 7> = heapless::Vec::new();
        let _ = assigned.push(("i2c_sda", self.i2c_sda_pin));
        let _ = assigned.push(("i2c_scl", self.i2c_scl_pin));
        let _ = assigned.push(("relay", self.relay_pin));
        let _ = assigned.push(("eth_clock", self.eth.clock.gpio()));
        let _ = assigned.push(("eth_mdc", self.eth.mdc_pin));
        let _ = assigned.push(("eth_mdio", self.eth.mdio_pin));
        if let Some(power) = self.eth.power_pin {
            let _ = assigned.push(("eth_power", power));
        }

        let mut used: heapless::Vec<i32, 7> = heapless::Vec::new();
        for (name, gpio) in assigned {
            if !pins::is_assignable(gpio) {
                return Err(ConfigError::InvalidPin(name));
            }
            if used.contains(&gpio) {
                return Err(ConfigError::PinConflict(gpio));
            }
            let _ = used.push(gpio);
        }

        if self.eth.phy_addr > 31 {
            return Err(ConfigError::InvalidPin("eth_phy_addr"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Dashboard credentials
// ---------------------------------------------------------------------------

/// Validated dashboard login.  Printable ASCII only; the username may not
/// contain `:` because Basic auth splits on the first one.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: heapless::String<MAX_USERNAME_LEN>,
    password: heapless::String<MAX_PASSWORD_LEN>,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Result<Self, ConfigError> {
        if username.is_empty() || !is_printable_ascii(username) || username.contains(':') {
            return Err(ConfigError::InvalidCredentials("username"));
        }
        if password.is_empty() || !is_printable_ascii(password) {
            return Err(ConfigError::InvalidCredentials("password"));
        }
        let username = heapless::String::try_from(username)
            .map_err(|_| ConfigError::InvalidCredentials("username"))?;
        let password = heapless::String::try_from(password)
            .map_err(|_| ConfigError::InvalidCredentials("password"))?;
        Ok(Self { username, password })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn is_factory_password(&self) -> bool {
        self.password.as_str() == DEFAULT_PASSWORD
    }
}

// Never print the password, even in debug logs.
impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7e).contains(&b))
}

// ---------------------------------------------------------------------------
// Raw configuration surface
// ---------------------------------------------------------------------------

/// Core system configuration, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemConfig {
    // --- Thresholds ---
    /// Fan turns ON strictly above this concentration (ppm).
    pub on_ppm: u16,
    /// Fan turns OFF strictly below this concentration (ppm).
    pub off_ppm: u16,

    // --- Timing ---
    /// Cycle start to cycle start (milliseconds).
    pub measurement_interval_ms: u64,

    // --- Dashboard ---
    pub http_port: u16,
    pub web_username: String,
    pub web_password: String,

    // --- Network (all blank = DHCP) ---
    pub static_ip: String,
    pub gateway: String,
    pub subnet: String,
    pub dns: String,

    // --- Pins ---
    pub hardware: HardwareConfig,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            on_ppm: 1000,
            off_ppm: 800,

            measurement_interval_ms: 30_000,

            http_port: 80,
            web_username: "admin".into(),
            web_password: DEFAULT_PASSWORD.into(),

            static_ip: String::new(),
            gateway: String::new(),
            subnet: String::new(),
            dns: String::new(),

            hardware: HardwareConfig::default(),
        }
    }
}

impl SystemConfig {
    /// Factory defaults with any `CO2FAN_*` variables set at build time
    /// applied on top.
    pub fn from_build_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| match key {
            "CO2FAN_ON_PPM" => option_env!("CO2FAN_ON_PPM"),
            "CO2FAN_OFF_PPM" => option_env!("CO2FAN_OFF_PPM"),
            "CO2FAN_INTERVAL_MS" => option_env!("CO2FAN_INTERVAL_MS"),
            "CO2FAN_HTTP_PORT" => option_env!("CO2FAN_HTTP_PORT"),
            "CO2FAN_USERNAME" => option_env!("CO2FAN_USERNAME"),
            "CO2FAN_PASSWORD" => option_env!("CO2FAN_PASSWORD"),
            "CO2FAN_STATIC_IP" => option_env!("CO2FAN_STATIC_IP"),
            "CO2FAN_GATEWAY" => option_env!("CO2FAN_GATEWAY"),
            "CO2FAN_SUBNET" => option_env!("CO2FAN_SUBNET"),
            "CO2FAN_DNS" => option_env!("CO2FAN_DNS"),
            "CO2FAN_I2C_SDA_GPIO" => option_env!("CO2FAN_I2C_SDA_GPIO"),
            "CO2FAN_I2C_SCL_GPIO" => option_env!("CO2FAN_I2C_SCL_GPIO"),
            "CO2FAN_RELAY_GPIO" => option_env!("CO2FAN_RELAY_GPIO"),
            _ => None,
        })
    }

    /// Apply overrides from `lookup`.  Numeric values that do not parse are
    /// rejected rather than ignored.
    pub fn with_overrides<'a>(
        mut self,
        lookup: impl Fn(&str) -> Option<&'a str>,
    ) -> Result<Self, ConfigError> {
        fn num<T: core::str::FromStr>(
            key: &'static str,
            raw: Option<&str>,
            slot: &mut T,
        ) -> Result<(), ConfigError> {
            if let Some(raw) = raw {
                *slot = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::MalformedOverride(key))?;
            }
            Ok(())
        }

        num("CO2FAN_ON_PPM", lookup("CO2FAN_ON_PPM"), &mut self.on_ppm)?;
        num("CO2FAN_OFF_PPM", lookup("CO2FAN_OFF_PPM"), &mut self.off_ppm)?;
        num(
            "CO2FAN_INTERVAL_MS",
            lookup("CO2FAN_INTERVAL_MS"),
            &mut self.measurement_interval_ms,
        )?;
        num("CO2FAN_HTTP_PORT", lookup("CO2FAN_HTTP_PORT"), &mut self.http_port)?;
        num(
            "CO2FAN_I2C_SDA_GPIO",
            lookup("CO2FAN_I2C_SDA_GPIO"),
            &mut self.hardware.i2c_sda_pin,
        )?;
        num(
            "CO2FAN_I2C_SCL_GPIO",
            lookup("CO2FAN_I2C_SCL_GPIO"),
            &mut self.hardware.i2c_scl_pin,
        )?;
        num(
            "CO2FAN_RELAY_GPIO",
            lookup("CO2FAN_RELAY_GPIO"),
            &mut self.hardware.relay_pin,
        )?;

        let text = [
            ("CO2FAN_USERNAME", &mut self.web_username),
            ("CO2FAN_PASSWORD", &mut self.web_password),
            ("CO2FAN_STATIC_IP", &mut self.static_ip),
            ("CO2FAN_GATEWAY", &mut self.gateway),
            ("CO2FAN_SUBNET", &mut self.subnet),
            ("CO2FAN_DNS", &mut self.dns),
        ];
        for (key, slot) in text {
            if let Some(v) = lookup(key) {
                *slot = v.to_owned();
            }
        }

        Ok(self)
    }

    /// Check every field and freeze the result.  Returns the first problem
    /// found; the firmware refuses to start the control loop on `Err`.
    pub fn validate(&self) -> Result<DeviceConfig, ConfigError> {
        let thresholds = Thresholds::new(self.on_ppm, self.off_ppm)?;

        if self.measurement_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.http_port == 0 {
            return Err(ConfigError::ZeroPort);
        }

        let credentials = Credentials::new(&self.web_username, &self.web_password)?;
        let network = NetworkSettings::resolve(&self.static_ip, &self.gateway, &self.subnet, &self.dns)?;
        self.hardware.validate()?;

        if credentials.is_factory_password() {
            warn!("Config: dashboard is using the factory password; set CO2FAN_PASSWORD");
        }

        Ok(DeviceConfig {
            thresholds,
            measurement_interval_ms: self.measurement_interval_ms,
            http_port: self.http_port,
            credentials,
            network,
            hardware: self.hardware,
        })
    }
}

// ---------------------------------------------------------------------------
// Validated configuration
// ---------------------------------------------------------------------------

/// Everything the firmware needs, checked.  No setters.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    thresholds: Thresholds,
    measurement_interval_ms: u64,
    http_port: u16,
    credentials: Credentials,
    network: NetworkSettings,
    hardware: HardwareConfig,
}

impl DeviceConfig {
    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn measurement_interval_ms(&self) -> u64 {
        self.measurement_interval_ms
    }

    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn network(&self) -> NetworkSettings {
        self.network
    }

    pub fn hardware(&self) -> &HardwareConfig {
        &self.hardware
    }
}
