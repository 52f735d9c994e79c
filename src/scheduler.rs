//! Fixed-interval measurement loop.
//!
//! ```text
//!        ┌────────────── interval_ms ──────────────┐
//!  ──────┼─────────────────────────────────────────┼──────▶ t
//!     cycle n                                   cycle n+1
//!     │
//!     ├─ SensorPort::read_co2_ppm ──▶ Sample
//!     ├─ HysteresisController::decide
//!     ├─ RelayPort::set_relay      (on change, or to resync after a failure)
//!     └─ StatusPublisher::publish  ──▶ dashboard
//! ```
//!
//! The grid is anchored to the first cycle.  A cycle that starts late keeps
//! the grid; a cycle that starts a whole interval (or more) late re-anchors
//! the grid at its own start.  Every poll that finds a cycle due runs
//! exactly one, so cycles are never skipped or run twice back-to-back.

use log::{debug, info};

use crate::app::events::ControllerEvent;
use crate::app::ports::{ClockPort, EventSink, RelayPort, SensorPort};
use crate::control::{HysteresisController, Sample};
use crate::status::{StatusPublisher, StatusSnapshot};

/// Upper bound on a single sleep inside [`MeasurementScheduler::run_forever`].
/// The idle hook (watchdog feed, link polling) runs at least this often.
pub const IDLE_SLICE_MS: u64 = 1_000;

/// Drives the controller once per interval and publishes the result.
pub struct MeasurementScheduler {
    controller: HysteresisController,
    publisher: StatusPublisher,
    interval_ms: u64,
    /// `None` until the first cycle runs: due immediately.
    next_due_ms: Option<u64>,
    cycle_count: u64,
    /// False until a relay write succeeds, and again after any failure.
    relay_in_sync: bool,
    last_ppm: Option<u16>,
    sensor_fault: bool,
    actuator_fault: bool,
}

impl MeasurementScheduler {
    /// `interval_ms` comes from a validated [`DeviceConfig`](crate::config::DeviceConfig)
    /// and is never zero.
    pub fn new(
        controller: HysteresisController,
        publisher: StatusPublisher,
        interval_ms: u64,
    ) -> Self {
        Self {
            controller,
            publisher,
            interval_ms: interval_ms.max(1),
            next_due_ms: None,
            cycle_count: 0,
            relay_in_sync: false,
            last_ppm: None,
            sensor_fault: false,
            actuator_fault: false,
        }
    }

    /// Announce the loop.  Publishes the boot snapshot so readers never see
    /// stale data from a previous scheduler.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.publisher.publish(StatusSnapshot::BOOT);
        info!(
            "Scheduler: interval={}ms on>{}ppm off<{}ppm",
            self.interval_ms,
            self.controller.thresholds().on_ppm(),
            self.controller.thresholds().off_ppm()
        );
        sink.emit(&ControllerEvent::Started {
            thresholds: self.controller.thresholds(),
            interval_ms: self.interval_ms,
        });
    }

    // ── One cycle ─────────────────────────────────────────────

    /// Run one measurement cycle now, regardless of the schedule.
    pub fn run_cycle(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + RelayPort),
        sink: &mut impl EventSink,
    ) -> StatusSnapshot {
        // 1. Acquire
        let sample = match hw.read_co2_ppm() {
            Ok(ppm) => {
                if self.sensor_fault {
                    sink.emit(&ControllerEvent::SensorRecovered { ppm });
                }
                self.sensor_fault = false;
                self.last_ppm = Some(ppm);
                Sample::valid(ppm)
            }
            Err(e) => {
                if !self.sensor_fault {
                    sink.emit(&ControllerEvent::SensorFault(e));
                } else {
                    debug!("Scheduler: sensor still failing: {e}");
                }
                self.sensor_fault = true;
                Sample::invalid()
            }
        };

        // 2. Decide
        let from = self.controller.state();
        let decision = self.controller.decide(sample);
        if decision.changed {
            sink.emit(&ControllerEvent::RelaySwitched {
                from,
                to: decision.state,
                ppm: sample.ppm,
            });
        }

        // 3. Actuate
        if decision.changed || !self.relay_in_sync {
            match hw.set_relay(decision.state.is_energized()) {
                Ok(()) => {
                    if self.actuator_fault {
                        sink.emit(&ControllerEvent::ActuatorRecovered(decision.state));
                    }
                    self.actuator_fault = false;
                    self.relay_in_sync = true;
                }
                Err(error) => {
                    if !self.actuator_fault {
                        sink.emit(&ControllerEvent::ActuatorFault {
                            target: decision.state,
                            error,
                        });
                    }
                    self.actuator_fault = true;
                    self.relay_in_sync = false;
                }
            }
        }

        // 4. Publish
        self.cycle_count += 1;
        let snapshot = StatusSnapshot {
            uptime_ms: now_ms,
            cycle: self.cycle_count,
            last_ppm: self.last_ppm,
            relay: decision.state,
            sensor_fault: self.sensor_fault,
            actuator_fault: self.actuator_fault,
        };
        self.publisher.publish(snapshot);
        sink.emit(&ControllerEvent::Telemetry(snapshot));
        snapshot
    }

    // ── Scheduling ────────────────────────────────────────────

    /// Run a cycle if one is due at `now_ms`.
    pub fn poll(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + RelayPort),
        sink: &mut impl EventSink,
    ) -> Option<StatusSnapshot> {
        let due = self.next_due_ms.unwrap_or(now_ms);
        if now_ms < due {
            return None;
        }

        let snapshot = self.run_cycle(now_ms, hw, sink);

        let next = due.saturating_add(self.interval_ms);
        self.next_due_ms = Some(if next > now_ms {
            next
        } else {
            debug!("Scheduler: overrun by {}ms, re-anchoring", now_ms - due);
            now_ms.saturating_add(self.interval_ms)
        });
        Some(snapshot)
    }

    /// Milliseconds until the next cycle is due (0 = due now).
    pub fn ms_until_due(&self, now_ms: u64) -> u64 {
        self.next_due_ms
            .map_or(0, |due| due.saturating_sub(now_ms))
    }

    /// Absolute due time of the next cycle, if one has been scheduled.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.next_due_ms
    }

    /// Run the loop for the lifetime of the device.
    ///
    /// `idle` runs after every sleep slice (never more than
    /// [`IDLE_SLICE_MS`] apart) and is where the watchdog gets fed.
    pub fn run_forever(
        &mut self,
        hw: &mut (impl SensorPort + RelayPort),
        clock: &mut impl ClockPort,
        sink: &mut impl EventSink,
        mut idle: impl FnMut(),
    ) -> ! {
        self.start(sink);
        loop {
            self.poll(clock.now_ms(), hw, sink);

            let wait = self.ms_until_due(clock.now_ms()).min(IDLE_SLICE_MS);
            if wait > 0 {
                clock.sleep_ms(wait);
            }
            idle();
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{RelayState, Thresholds};
    use crate::error::{ActuatorError, SensorError};
    use crate::status::status_store;

    /// Scripted sensor readings plus a relay that records every write.
    struct Rig {
        readings: Vec<Result<u16, SensorError>>,
        relay_ok: bool,
        writes: Vec<bool>,
    }

    impl Rig {
        fn new(readings: &[Result<u16, SensorError>]) -> Self {
            let mut readings = readings.to_vec();
            readings.reverse();
            Self {
                readings,
                relay_ok: true,
                writes: Vec::new(),
            }
        }
    }

    impl SensorPort for Rig {
        fn read_co2_ppm(&mut self) -> Result<u16, SensorError> {
            self.readings.pop().unwrap_or(Err(SensorError::NotReady))
        }
    }

    impl RelayPort for Rig {
        fn set_relay(&mut self, energized: bool) -> Result<(), ActuatorError> {
            if self.relay_ok {
                self.writes.push(energized);
                Ok(())
            } else {
                Err(ActuatorError::GpioWriteFailed(-1))
            }
        }
    }

    #[derive(Default)]
    struct Events(Vec<ControllerEvent>);

    impl EventSink for Events {
        fn emit(&mut self, event: &ControllerEvent) {
            self.0.push(event.clone());
        }
    }

    fn scheduler(interval_ms: u64) -> (MeasurementScheduler, crate::status::StatusReader) {
        let (publisher, reader) = status_store();
        let controller = HysteresisController::new(Thresholds::new(1000, 800).unwrap());
        (
            MeasurementScheduler::new(controller, publisher, interval_ms),
            reader,
        )
    }

    #[test]
    fn first_poll_runs_immediately() {
        let (mut s, _) = scheduler(1000);
        let mut rig = Rig::new(&[Ok(600)]);
        let mut ev = Events::default();
        assert_eq!(s.ms_until_due(0), 0);
        assert!(s.poll(0, &mut rig, &mut ev).is_some());
        assert_eq!(s.next_due_ms(), Some(1000));
    }

    #[test]
    fn zero_interval_is_clamped_to_one_ms() {
        let (s, _) = scheduler(0);
        assert_eq!(s.interval_ms(), 1);
        let (s, _) = scheduler(30_000);
        assert_eq!(s.interval_ms(), 30_000);
    }

    #[test]
    fn late_cycle_keeps_the_grid() {
        let (mut s, _) = scheduler(1000);
        let mut rig = Rig::new(&[Ok(600), Ok(600), Ok(600)]);
        let mut ev = Events::default();

        assert!(s.poll(0, &mut rig, &mut ev).is_some());
        assert!(s.poll(500, &mut rig, &mut ev).is_none());
        assert_eq!(s.ms_until_due(500), 500);

        assert!(s.poll(1005, &mut rig, &mut ev).is_some());
        assert_eq!(s.next_due_ms(), Some(2000));
    }

    #[test]
    fn overrun_reanchors_without_skipping() {
        let (mut s, _) = scheduler(1000);
        let mut rig = Rig::new(&[Ok(600), Ok(600), Ok(600)]);
        let mut ev = Events::default();

        s.poll(0, &mut rig, &mut ev);
        // 1200 ms late: one cycle runs, next is a full interval later.
        assert!(s.poll(2200, &mut rig, &mut ev).is_some());
        assert_eq!(s.next_due_ms(), Some(3200));
        assert!(s.poll(2201, &mut rig, &mut ev).is_none());
        assert_eq!(s.cycle_count(), 2);
    }

    #[test]
    fn relay_written_only_on_change_once_in_sync() {
        let (mut s, reader) = scheduler(1000);
        let mut rig = Rig::new(&[Ok(600), Ok(1200), Ok(900), Ok(750)]);
        let mut ev = Events::default();

        let states: Vec<RelayState> = (0..4)
            .map(|i| s.run_cycle(i * 1000, &mut rig, &mut ev).relay)
            .collect();

        assert_eq!(
            states,
            [RelayState::Off, RelayState::On, RelayState::On, RelayState::Off]
        );
        // Boot assertion, then one write per edge.
        assert_eq!(rig.writes, [false, true, false]);
        assert_eq!(reader.latest().last_ppm, Some(750));
        assert_eq!(reader.latest().cycle, 4);
    }

    #[test]
    fn sensor_failure_holds_relay_and_keeps_last_ppm() {
        let (mut s, reader) = scheduler(1000);
        let mut rig = Rig::new(&[Ok(1500), Err(SensorError::BusFailed), Err(SensorError::CrcMismatch)]);
        let mut ev = Events::default();

        s.run_cycle(0, &mut rig, &mut ev);
        let snap = s.run_cycle(1000, &mut rig, &mut ev);
        assert!(snap.sensor_fault);
        assert_eq!(snap.relay, RelayState::On);
        assert_eq!(snap.last_ppm, Some(1500));

        s.run_cycle(2000, &mut rig, &mut ev);
        assert_eq!(reader.latest().relay, RelayState::On);

        // Fault is reported once, not every cycle.
        let faults = ev
            .0
            .iter()
            .filter(|e| matches!(e, ControllerEvent::SensorFault(_)))
            .count();
        assert_eq!(faults, 1);
    }

    #[test]
    fn failed_write_is_reasserted_next_cycle() {
        let (mut s, _) = scheduler(1000);
        let mut rig = Rig::new(&[Ok(600), Ok(1200), Ok(1100)]);
        let mut ev = Events::default();

        s.run_cycle(0, &mut rig, &mut ev);
        rig.relay_ok = false;
        let snap = s.run_cycle(1000, &mut rig, &mut ev);
        assert!(snap.actuator_fault);
        assert_eq!(snap.relay, RelayState::On);

        rig.relay_ok = true;
        let snap = s.run_cycle(2000, &mut rig, &mut ev);
        assert!(!snap.actuator_fault);
        assert_eq!(rig.writes, [false, true]);
        assert!(ev.0.contains(&ControllerEvent::ActuatorRecovered(RelayState::On)));
    }

    #[test]
    fn start_publishes_boot_snapshot() {
        let (mut s, reader) = scheduler(30_000);
        let mut ev = Events::default();
        s.start(&mut ev);
        assert_eq!(reader.latest(), StatusSnapshot::BOOT);
        assert!(matches!(
            ev.0.first(),
            Some(ControllerEvent::Started { interval_ms: 30_000, .. })
        ));
    }
}
