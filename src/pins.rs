//! Factory GPIO / peripheral assignments for the Olimex ESP32-POE-ISO.
//!
//! These are the *defaults* only.  The live assignment is the validated
//! [`HardwareConfig`](crate::config::HardwareConfig) built at boot; drivers
//! take their pin numbers from there, never from this module.

// ---------------------------------------------------------------------------
// SCD-40 CO2 sensor (I2C, UEXT connector)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 13;
pub const I2C_SCL_GPIO: i32 = 16;
/// Standard-mode I2C.  The SCD-40 tolerates up to 100 kHz.
pub const I2C_FREQ_HZ: u32 = 100_000;
/// Legacy I2C driver port.
pub const I2C_PORT: i32 = 0;
/// Per-transfer bus timeout.  A stuck bus fails the read instead of
/// hanging the control task.
pub const I2C_TIMEOUT_MS: u32 = 100;

// ---------------------------------------------------------------------------
// Fan relay
// ---------------------------------------------------------------------------

/// Digital output: HIGH = coil energised = fan running.
pub const RELAY_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Ethernet (LAN8720 over RMII)
// ---------------------------------------------------------------------------

/// PHY power enable.  Held HIGH once the MAC is ready.
pub const ETH_POWER_GPIO: i32 = 12;
/// SMI management clock.
pub const ETH_MDC_GPIO: i32 = 23;
/// SMI management data.
pub const ETH_MDIO_GPIO: i32 = 18;
/// PHY address strapping on this board.
pub const ETH_PHY_ADDR: u8 = 0;

// ---------------------------------------------------------------------------
// Reserved
// ---------------------------------------------------------------------------

/// RMII data/control lines fixed by the ESP32 EMAC.  Never assignable.
pub const RMII_RESERVED: [i32; 6] = [19, 21, 22, 25, 26, 27];

/// True if `gpio` exists, can drive its line and is free for assignment.
pub fn is_assignable(gpio: i32) -> bool {
    (0..FIRST_INPUT_ONLY_GPIO).contains(&gpio)
        && !RMII_RESERVED.contains(&gpio)
        && !FLASH_RESERVED.contains(&gpio)
        && !NOT_PRESENT.contains(&gpio)
}

/// GPIO 6..=11 carry the SPI flash.  Driving any of them crashes the chip.
pub const FLASH_RESERVED: [i32; 6] = [6, 7, 8, 9, 10, 11];

/// Numbers inside the output-capable range that the ESP32 does not bond out.
pub const NOT_PRESENT: [i32; 6] = [20, 24, 28, 29, 30, 31];

/// GPIO 34..=39 are input-only.
pub const FIRST_INPUT_ONLY_GPIO: i32 = 34;
