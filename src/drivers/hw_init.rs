//! One-shot hardware peripheral initialization.
//!
//! Configures the relay and PHY-power GPIOs and installs the legacy I2C
//! master driver using raw ESP-IDF sys calls.  Called once from `main()`
//! before the control loop starts, with pin numbers from the validated
//! [`HardwareConfig`].

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::config::HardwareConfig;
#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    I2cConfigFailed(i32),
    I2cInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::I2cConfigFailed(rc) => write!(f, "I2C param config failed (rc={})", rc),
            Self::I2cInstallFailed(rc) => write!(f, "I2C driver install failed (rc={})", rc),
        }
    }
}

impl core::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
pub fn init_peripherals(hw: &HardwareConfig) -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_gpio_outputs(hw)?;
        init_i2c(hw)?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals(hw: &HardwareConfig) -> Result<(), HwInitError> {
    log::info!(
        "hw_init(sim): peripheral init skipped (relay=GPIO{}, sda=GPIO{}, scl=GPIO{})",
        hw.relay_pin,
        hw.i2c_sda_pin,
        hw.i2c_scl_pin
    );
    Ok(())
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn configure_output(pin: i32, level: u32) -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    // Latch the level first so the pin never glitches high on configure.
    unsafe { gpio_set_level(pin, level) };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    unsafe { gpio_set_level(pin, level) };
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs(hw: &HardwareConfig) -> Result<(), HwInitError> {
    // Relay de-energised: fan OFF until the controller says otherwise.
    unsafe { configure_output(hw.relay_pin, 0)? };

    // LAN8720 power enable.  Must be high before the EMAC probes the PHY.
    if let Some(power) = hw.eth.power_pin {
        unsafe { configure_output(power, 1)? };
    }

    info!("hw_init: GPIO outputs configured (relay=GPIO{} LOW)", hw.relay_pin);
    Ok(())
}

/// Drive an already-configured output.  Returns the ESP-IDF error code on
/// failure.
#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) -> Result<(), i32> {
    // SAFETY: gpio_set_level writes to an already-configured output pin;
    // pin was validated during config load. Main-loop only.
    let ret = unsafe { gpio_set_level(pin, u32::from(high)) };
    if ret == ESP_OK as i32 { Ok(()) } else { Err(ret) }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) -> Result<(), i32> {
    Ok(())
}

// ── I2C (legacy master driver) ────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_i2c(hw: &HardwareConfig) -> Result<(), HwInitError> {
    let cfg = i2c_config_t {
        mode: i2c_mode_t_I2C_MODE_MASTER,
        sda_io_num: hw.i2c_sda_pin,
        sda_pullup_en: true,
        scl_io_num: hw.i2c_scl_pin,
        scl_pullup_en: true,
        __bindgen_anon_1: i2c_config_t__bindgen_ty_1 {
            master: i2c_config_t__bindgen_ty_1__bindgen_ty_1 {
                clk_speed: pins::I2C_FREQ_HZ,
            },
        },
        ..Default::default()
    };
    let ret = unsafe { i2c_param_config(pins::I2C_PORT, &cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::I2cConfigFailed(ret)); }

    let ret = unsafe { i2c_driver_install(pins::I2C_PORT, i2c_mode_t_I2C_MODE_MASTER, 0, 0, 0) };
    if ret != ESP_OK as i32 { return Err(HwInitError::I2cInstallFailed(ret)); }

    info!(
        "hw_init: I2C{} master @ {} Hz (sda=GPIO{}, scl=GPIO{})",
        pins::I2C_PORT,
        pins::I2C_FREQ_HZ,
        hw.i2c_sda_pin,
        hw.i2c_scl_pin
    );
    Ok(())
}
