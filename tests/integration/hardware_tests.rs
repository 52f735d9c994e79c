//! Integration tests for `HardwareAdapter`: a simulated SCD-40 on an
//! `embedded_hal` bus plus the host relay driver, driven by the scheduler.

use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};

use crate::mock_hw::LogSink;

use co2fan::adapters::hardware::HardwareAdapter;
use co2fan::app::ports::SensorPort;
use co2fan::control::{HysteresisController, RelayState, Thresholds};
use co2fan::drivers::relay::RelayDriver;
use co2fan::error::SensorError;
use co2fan::scheduler::MeasurementScheduler;
use co2fan::sensors::Scd40;
use co2fan::sensors::scd40::{SCD40_ADDR, crc8};
use co2fan::status::status_store;

/// Answers "data ready" then a measurement frame for each queued ppm.
/// `None` in the queue answers "not ready".
#[derive(Default)]
struct SimScd40 {
    queue: VecDeque<Option<u16>>,
    pending: VecDeque<Vec<u8>>,
    corrupt_next_frame: bool,
}

impl SimScd40 {
    fn with(readings: &[Option<u16>]) -> Self {
        Self {
            queue: readings.iter().copied().collect(),
            ..Self::default()
        }
    }

    fn word(w: u16) -> [u8; 3] {
        let [hi, lo] = w.to_be_bytes();
        [hi, lo, crc8(&[hi, lo])]
    }
}

impl ErrorType for SimScd40 {
    type Error = ErrorKind;
}

impl I2c for SimScd40 {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != SCD40_ADDR {
            return Err(ErrorKind::Other);
        }
        for op in operations {
            match op {
                Operation::Write(cmd) => match &cmd[..] {
                    [0xE4, 0xB8] => {
                        let ready = self.queue.front().copied().flatten().is_some();
                        if !ready {
                            self.queue.pop_front();
                        }
                        let status = if ready { 0x8006 } else { 0x8000 };
                        self.pending.push_back(Self::word(status).to_vec());
                    }
                    [0xEC, 0x05] => {
                        let ppm = self.queue.pop_front().flatten().unwrap_or(0);
                        let mut frame =
                            [Self::word(ppm), Self::word(0x6667), Self::word(0x5EB9)].concat();
                        if std::mem::take(&mut self.corrupt_next_frame) {
                            frame[2] ^= 0xFF;
                        }
                        self.pending.push_back(frame);
                    }
                    _ => {}
                },
                Operation::Read(buf) => {
                    let reply = self.pending.pop_front().ok_or(ErrorKind::Other)?;
                    buf.copy_from_slice(&reply[..buf.len()]);
                }
            }
        }
        Ok(())
    }
}

struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

fn adapter(bus: SimScd40) -> HardwareAdapter<SimScd40, NoDelay> {
    HardwareAdapter::new(Scd40::new(bus, NoDelay), RelayDriver::new(4))
}

#[test]
fn adapter_reads_ppm_through_the_sensor_driver() {
    let mut hw = adapter(SimScd40::with(&[Some(612)]));
    assert_eq!(hw.read_co2_ppm(), Ok(612));
}

#[test]
fn not_ready_and_crc_errors_surface_as_sensor_errors() {
    let mut hw = adapter(SimScd40::with(&[None]));
    assert_eq!(hw.read_co2_ppm(), Err(SensorError::NotReady));

    let mut bus = SimScd40::with(&[Some(900)]);
    bus.corrupt_next_frame = true;
    let mut hw = adapter(bus);
    assert_eq!(hw.read_co2_ppm(), Err(SensorError::CrcMismatch));
}

#[test]
fn scheduler_drives_relay_driver_through_adapter() {
    let (publisher, reader) = status_store();
    let controller = HysteresisController::new(Thresholds::new(1000, 800).unwrap());
    let mut sched = MeasurementScheduler::new(controller, publisher, 1000);
    let mut sink = LogSink::new();
    let mut hw = adapter(SimScd40::with(&[Some(1300), None, Some(950), Some(700)]));

    sched.poll(0, &mut hw, &mut sink);
    assert!(hw.relay().is_energized());

    // Not ready: relay held.
    sched.poll(1000, &mut hw, &mut sink);
    assert!(reader.latest().sensor_fault);
    assert!(hw.relay().is_energized());

    sched.poll(2000, &mut hw, &mut sink);
    assert!(hw.relay().is_energized());

    sched.poll(3000, &mut hw, &mut sink);
    assert!(!hw.relay().is_energized());
    assert_eq!(reader.latest().relay, RelayState::Off);
    assert_eq!(reader.latest().last_ppm, Some(700));
}
