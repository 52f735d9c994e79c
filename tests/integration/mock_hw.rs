//! Mock hardware, clock and event sink for integration tests.
//!
//! Scripts sensor readings, records every relay write and every emitted
//! event so tests can assert on the full history without touching real
//! I2C or GPIO.

use std::collections::VecDeque;

use co2fan::app::events::ControllerEvent;
use co2fan::app::ports::{ClockPort, EventSink, RelayPort, SensorPort};
use co2fan::error::{ActuatorError, SensorError};

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    readings: VecDeque<Result<u16, SensorError>>,
    /// Queued relay write outcomes; empty = succeed.
    relay_failures: VecDeque<bool>,
    pub relay_writes: Vec<bool>,
    /// Physical coil level after the last successful write.
    pub coil: bool,
    pub reads: usize,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            readings: VecDeque::new(),
            relay_failures: VecDeque::new(),
            relay_writes: Vec::new(),
            coil: false,
            reads: 0,
        }
    }

    pub fn with_ppm(readings: &[u16]) -> Self {
        let mut hw = Self::new();
        hw.push_ppm(readings);
        hw
    }

    pub fn push_ppm(&mut self, readings: &[u16]) {
        self.readings.extend(readings.iter().map(|&p| Ok(p)));
    }

    pub fn push_failure(&mut self, error: SensorError) {
        self.readings.push_back(Err(error));
    }

    /// Fail the next `n` relay writes.
    pub fn fail_relay_writes(&mut self, n: usize) {
        self.relay_failures.extend(std::iter::repeat_n(true, n));
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_co2_ppm(&mut self) -> Result<u16, SensorError> {
        self.reads += 1;
        self.readings
            .pop_front()
            .unwrap_or(Err(SensorError::BusFailed))
    }
}

impl RelayPort for MockHardware {
    fn set_relay(&mut self, energized: bool) -> Result<(), ActuatorError> {
        if self.relay_failures.pop_front().unwrap_or(false) {
            return Err(ActuatorError::GpioWriteFailed(-1));
        }
        self.relay_writes.push(energized);
        self.coil = energized;
        Ok(())
    }
}

// ── MockClock ─────────────────────────────────────────────────

/// Manual clock: `sleep_ms` advances time instantly.  Optionally stops
/// the run (by panicking) once `stop_at` is reached, which is how tests
/// get out of `run_forever`.
pub struct MockClock {
    pub now: u64,
    pub sleeps: Vec<u64>,
    pub stop_at: Option<u64>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn new() -> Self {
        Self {
            now: 0,
            sleeps: Vec::new(),
            stop_at: None,
        }
    }

    pub fn stopping_at(stop_at: u64) -> Self {
        Self {
            stop_at: Some(stop_at),
            ..Self::new()
        }
    }
}

impl ClockPort for MockClock {
    fn now_ms(&self) -> u64 {
        self.now
    }

    fn sleep_ms(&mut self, ms: u64) {
        self.sleeps.push(ms);
        self.now += ms;
        if self.stop_at.is_some_and(|t| self.now >= t) {
            panic!("mock clock reached stop time");
        }
    }
}

// ── LogSink ───────────────────────────────────────────────────

/// Collects every emitted event.
#[derive(Default)]
pub struct LogSink {
    pub events: Vec<ControllerEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&ControllerEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &ControllerEvent) {
        self.events.push(event.clone());
    }
}
