//! `embedded_hal` I2C on top of the legacy ESP-IDF master driver.
//!
//! Every transfer carries a bounded FreeRTOS tick timeout, so a stuck
//! bus fails the current measurement instead of wedging the control
//! loop.  The driver itself is installed by
//! [`hw_init::init_peripherals`](super::hw_init::init_peripherals).

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation, SevenBitAddress};
use esp_idf_svc::sys::*;

use crate::pins;

/// Failed transfer; carries the ESP-IDF error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cBusError(pub i32);

impl embedded_hal::i2c::Error for I2cBusError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

pub struct EspI2cBus {
    port: i2c_port_t,
    timeout_ticks: TickType_t,
}

impl EspI2cBus {
    /// Wrap the port installed by `hw_init`.
    pub fn new() -> Self {
        Self {
            port: pins::I2C_PORT,
            timeout_ticks: (pins::I2C_TIMEOUT_MS * configTICK_RATE_HZ / 1000).max(1),
        }
    }

    fn check(ret: esp_err_t) -> Result<(), I2cBusError> {
        if ret == ESP_OK as i32 { Ok(()) } else { Err(I2cBusError(ret)) }
    }
}

impl Default for EspI2cBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorType for EspI2cBus {
    type Error = I2cBusError;
}

impl I2c<SevenBitAddress> for EspI2cBus {
    fn read(&mut self, address: u8, read: &mut [u8]) -> Result<(), Self::Error> {
        // SAFETY: buffer is valid for `len` bytes for the duration of the call.
        Self::check(unsafe {
            i2c_master_read_from_device(
                self.port,
                address,
                read.as_mut_ptr(),
                read.len(),
                self.timeout_ticks,
            )
        })
    }

    fn write(&mut self, address: u8, write: &[u8]) -> Result<(), Self::Error> {
        // SAFETY: buffer is valid for `len` bytes for the duration of the call.
        Self::check(unsafe {
            i2c_master_write_to_device(
                self.port,
                address,
                write.as_ptr(),
                write.len(),
                self.timeout_ticks,
            )
        })
    }

    fn write_read(
        &mut self,
        address: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), Self::Error> {
        // SAFETY: both buffers are valid for their lengths during the call.
        Self::check(unsafe {
            i2c_master_write_read_device(
                self.port,
                address,
                write.as_ptr(),
                write.len(),
                read.as_mut_ptr(),
                read.len(),
                self.timeout_ticks,
            )
        })
    }

    /// Each operation runs as its own bus transaction.  The SCD-40 only
    /// uses single-operation transfers.
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for op in operations {
            match op {
                Operation::Write(bytes) => self.write(address, bytes)?,
                Operation::Read(buf) => self.read(address, buf)?,
            }
        }
        Ok(())
    }
}
