//! Integration tests for the scheduler → controller → relay → status
//! pipeline, driven through mock ports.

use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::mock_hw::{LogSink, MockClock, MockHardware};

use co2fan::app::events::ControllerEvent;
use co2fan::config::SystemConfig;
use co2fan::control::{HysteresisController, RelayState};
use co2fan::drivers::watchdog::{MAX_FEED_GAP_MS, WATCHDOG_TIMEOUT_MS, Watchdog};
use co2fan::error::SensorError;
use co2fan::scheduler::{IDLE_SLICE_MS, MeasurementScheduler};
use co2fan::status::{StatusReader, StatusSnapshot, status_store};

fn make_scheduler(interval_ms: u64) -> (MeasurementScheduler, StatusReader, LogSink) {
    let config = SystemConfig {
        measurement_interval_ms: interval_ms,
        ..SystemConfig::default()
    }
    .validate()
    .unwrap();
    let (publisher, reader) = status_store();
    let controller = HysteresisController::new(config.thresholds());
    let mut sink = LogSink::new();
    let mut scheduler =
        MeasurementScheduler::new(controller, publisher, config.measurement_interval_ms());
    scheduler.start(&mut sink);
    (scheduler, reader, sink)
}

#[test]
fn documented_sequence_drives_the_relay() {
    let (mut sched, reader, mut sink) = make_scheduler(1000);
    let mut hw = MockHardware::with_ppm(&[600, 1200, 900, 750]);

    let mut relay = Vec::new();
    for t in [0, 1000, 2000, 3000] {
        let snap = sched.poll(t, &mut hw, &mut sink).unwrap();
        relay.push(snap.relay);
    }

    assert_eq!(
        relay,
        [RelayState::Off, RelayState::On, RelayState::On, RelayState::Off]
    );
    assert!(!hw.coil);
    assert_eq!(reader.latest().last_ppm, Some(750));
    assert_eq!(
        sink.count(|e| matches!(e, ControllerEvent::RelaySwitched { .. })),
        2
    );
}

#[test]
fn persistent_sensor_failure_holds_relay_on() {
    let (mut sched, reader, mut sink) = make_scheduler(1000);
    let mut hw = MockHardware::with_ppm(&[1500]);
    for _ in 0..5 {
        hw.push_failure(SensorError::CrcMismatch);
    }

    for i in 0..6 {
        sched.poll(i * 1000, &mut hw, &mut sink);
    }

    let snap = reader.latest();
    assert_eq!(snap.relay, RelayState::On);
    assert!(snap.sensor_fault);
    assert_eq!(snap.last_ppm, Some(1500));
    assert!(hw.coil);
    // Only the boot assertion and the switch-on; nothing while faulted.
    assert_eq!(hw.relay_writes, [true]);
}

#[test]
fn sensor_recovery_clears_fault_and_resumes_control() {
    let (mut sched, reader, mut sink) = make_scheduler(1000);
    let mut hw = MockHardware::with_ppm(&[1500]);
    hw.push_failure(SensorError::BusFailed);
    hw.push_ppm(&[700]);

    for i in 0..3 {
        sched.poll(i * 1000, &mut hw, &mut sink);
    }

    let snap = reader.latest();
    assert!(!snap.sensor_fault);
    assert_eq!(snap.relay, RelayState::Off);
    assert!(sink.events.contains(&ControllerEvent::SensorRecovered { ppm: 700 }));
}

#[test]
fn failed_relay_write_is_superseded_by_next_cycle() {
    let (mut sched, reader, mut sink) = make_scheduler(1000);
    let mut hw = MockHardware::with_ppm(&[600, 1200, 1100]);

    sched.poll(0, &mut hw, &mut sink);
    hw.fail_relay_writes(1);
    sched.poll(1000, &mut hw, &mut sink);
    assert!(reader.latest().actuator_fault);
    assert!(!hw.coil, "coil must still be off after the failed write");

    sched.poll(2000, &mut hw, &mut sink);
    assert!(!reader.latest().actuator_fault);
    assert!(hw.coil, "state re-asserted on the next cycle");
}

#[test]
fn first_boot_snapshot_is_off_and_unknown() {
    let (_sched, reader, sink) = make_scheduler(30_000);
    assert_eq!(reader.latest(), StatusSnapshot::BOOT);
    assert_eq!(
        sink.count(|e| matches!(e, ControllerEvent::Started { .. })),
        1
    );
}

#[test]
fn grid_is_kept_across_late_polls() {
    let (mut sched, _reader, mut sink) = make_scheduler(1000);
    let mut hw = MockHardware::with_ppm(&[600; 8]);

    assert!(sched.poll(0, &mut hw, &mut sink).is_some());
    assert!(sched.poll(500, &mut hw, &mut sink).is_none());
    assert!(sched.poll(1005, &mut hw, &mut sink).is_some());
    assert_eq!(sched.next_due_ms(), Some(2000));
    assert!(sched.poll(2000, &mut hw, &mut sink).is_some());
    assert!(sched.poll(3700, &mut hw, &mut sink).is_some());
    assert_eq!(sched.next_due_ms(), Some(4000));
    assert_eq!(hw.reads, 4);
}

#[test]
fn run_forever_sleeps_in_bounded_slices_and_feeds_idle() {
    let (mut sched, reader, mut sink) = make_scheduler(3000);
    let mut hw = MockHardware::with_ppm(&[600; 8]);
    let mut clock = MockClock::stopping_at(9500);
    let mut idle_calls = 0u32;

    let result = catch_unwind(AssertUnwindSafe(|| {
        sched.run_forever(&mut hw, &mut clock, &mut sink, || idle_calls += 1);
    }));
    assert!(result.is_err(), "run_forever only ends via the mock clock");

    // Cycles at 0, 3000, 6000, 9000.
    assert_eq!(sched.cycle_count(), 4);
    assert_eq!(reader.latest().cycle, 4);
    assert!(clock.sleeps.iter().all(|&ms| ms <= IDLE_SLICE_MS));
    assert_eq!(idle_calls, 9);
}

#[test]
fn run_forever_feeds_watchdog_well_inside_its_timeout() {
    let (mut sched, _reader, mut sink) = make_scheduler(30_000);
    let mut hw = MockHardware::with_ppm(&[900; 4]);
    let mut clock = MockClock::stopping_at(65_500);
    let watchdog = Watchdog::new();

    let result = catch_unwind(AssertUnwindSafe(|| {
        sched.run_forever(&mut hw, &mut clock, &mut sink, || watchdog.feed());
    }));
    assert!(result.is_err());

    // Cycles at 0, 30 s, 60 s; one feed per completed 1 s slice.
    assert_eq!(sched.cycle_count(), 3);
    assert_eq!(watchdog.feed_count(), 65);
    let longest = clock.sleeps.iter().copied().max().unwrap();
    assert!(longest <= IDLE_SLICE_MS);
    assert!(longest < MAX_FEED_GAP_MS);
    assert!(2 * MAX_FEED_GAP_MS < u64::from(WATCHDOG_TIMEOUT_MS));
}
