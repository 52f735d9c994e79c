//! Sensirion SCD-40 photoacoustic CO2 sensor (I2C).
//!
//! The sensor runs in periodic mode and refreshes its measurement every
//! 5 s.  Every 16-bit word on the wire is followed by a CRC-8
//! (poly 0x31, init 0xFF).
//!
//! ## Dual-target design
//!
//! The driver is generic over `embedded_hal` I2C and delay traits.  On
//! ESP-IDF it runs on [`EspI2cBus`](crate::drivers::i2c::EspI2cBus); on
//! host it runs on the mock buses in the tests.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{debug, info, warn};

use crate::error::SensorError;
use crate::pins;

/// Fixed 7-bit I2C address.
pub const SCD40_ADDR: u8 = 0x62;

const CMD_START_PERIODIC: u16 = 0x21B1;
const CMD_STOP_PERIODIC: u16 = 0x3F86;
const CMD_DATA_READY: u16 = 0xE4B8;
const CMD_READ_MEASUREMENT: u16 = 0xEC05;

/// Command execution time before a read may follow.
const READ_DELAY_MS: u32 = 1;
/// The sensor ignores commands for this long after a stop.
const STOP_DELAY_MS: u32 = 500;

/// Upper bound on [`Scd40::read_co2_ppm`]: two command/read exchanges,
/// each transfer capped by the bus timeout.
pub const READ_WORST_CASE_MS: u32 = 2 * (2 * pins::I2C_TIMEOUT_MS + READ_DELAY_MS);

/// First periodic measurement is ready this long after start.
pub const WARMUP_MS: u32 = 5_000;

/// One decoded measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub co2_ppm: u16,
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

/// Sensirion CRC-8 over one word.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0xFF;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x31
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Split `[msb, lsb, crc, msb, lsb, crc, ...]` into checked words.
fn decode_words<const N: usize>(buf: &[u8]) -> Result<[u16; N], SensorError> {
    let mut words = [0u16; N];
    for (word, chunk) in words.iter_mut().zip(buf.chunks_exact(3)) {
        if crc8(&chunk[..2]) != chunk[2] {
            return Err(SensorError::CrcMismatch);
        }
        *word = u16::from_be_bytes([chunk[0], chunk[1]]);
    }
    Ok(words)
}

pub struct Scd40<I, D> {
    i2c: I,
    delay: D,
}

impl<I: I2c, D: DelayNs> Scd40<I, D> {
    pub fn new(i2c: I, delay: D) -> Self {
        Self { i2c, delay }
    }

    fn command(&mut self, cmd: u16) -> Result<(), SensorError> {
        self.i2c
            .write(SCD40_ADDR, &cmd.to_be_bytes())
            .map_err(|_| SensorError::BusFailed)
    }

    fn read_words<const N: usize, const B: usize>(
        &mut self,
        cmd: u16,
    ) -> Result<[u16; N], SensorError> {
        self.command(cmd)?;
        self.delay.delay_ms(READ_DELAY_MS);
        let mut buf = [0u8; B];
        self.i2c
            .read(SCD40_ADDR, &mut buf)
            .map_err(|_| SensorError::BusFailed)?;
        decode_words::<N>(&buf)
    }

    /// Begin 5-second periodic sampling.
    pub fn start_periodic_measurement(&mut self) -> Result<(), SensorError> {
        self.command(CMD_START_PERIODIC)?;
        info!("SCD40: periodic measurement started");
        Ok(())
    }

    /// Stop periodic sampling.  Blocks for the sensor's 500 ms settle time.
    pub fn stop_periodic_measurement(&mut self) -> Result<(), SensorError> {
        self.command(CMD_STOP_PERIODIC)?;
        self.delay.delay_ms(STOP_DELAY_MS);
        Ok(())
    }

    /// `true` if a measurement is waiting to be read.
    pub fn data_ready(&mut self) -> Result<bool, SensorError> {
        let [status] = self.read_words::<1, 3>(CMD_DATA_READY)?;
        // Lower 11 bits all zero = not ready.
        Ok(status & 0x07FF != 0)
    }

    /// Read and decode the latest measurement.
    pub fn read_measurement(&mut self) -> Result<Measurement, SensorError> {
        let [co2, t_raw, rh_raw] = self.read_words::<3, 9>(CMD_READ_MEASUREMENT)?;
        Ok(Measurement {
            co2_ppm: co2,
            temperature_c: -45.0 + 175.0 * f32::from(t_raw) / 65535.0,
            humidity_pct: 100.0 * f32::from(rh_raw) / 65535.0,
        })
    }

    /// Only a ready, non-zero CO2 reading counts as a sample.
    pub fn read_co2_ppm(&mut self) -> Result<u16, SensorError> {
        if !self.data_ready()? {
            return Err(SensorError::NotReady);
        }
        let m = self.read_measurement()?;
        if m.co2_ppm == 0 {
            warn!("SCD40: 0 ppm reading discarded");
            return Err(SensorError::OutOfRange(0));
        }
        debug!(
            "SCD40: co2={}ppm T={:.1}\u{00b0}C RH={:.1}%",
            m.co2_ppm, m.temperature_c, m.humidity_pct
        );
        Ok(m.co2_ppm)
    }

    /// Give back the bus and delay provider.
    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }
}
