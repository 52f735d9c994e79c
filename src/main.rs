//! Co2Fan firmware entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter     LogEventSink   Esp32TimeAdapter           │
//! │  (Sensor+Relay)      (EventSink)    (ClockPort)                │
//! │  EthernetLink        EspHttpServer ──▶ DashboardService        │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  MeasurementScheduler ──▶ HysteresisController          │    │
//! │  │           │                                             │    │
//! │  │           └──publish──▶ StatusStore ──read──▶ dashboard │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Boot order: logger → config (fatal if invalid) → peripherals → sensor
//! warm-up → network + dashboard (non-fatal) → control loop (never returns).
#![deny(unused_must_use)]

use std::sync::Arc;

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::prelude::Peripherals;
use log::{error, info, warn};

use co2fan::adapters::ethernet::{EthernetLink, RmiiPins};
use co2fan::adapters::hardware::HardwareAdapter;
use co2fan::adapters::http_server::start_dashboard_server;
use co2fan::adapters::log_sink::LogEventSink;
use co2fan::adapters::time::Esp32TimeAdapter;
use co2fan::config::SystemConfig;
use co2fan::control::HysteresisController;
use co2fan::dashboard::DashboardService;
use co2fan::drivers::hw_init;
use co2fan::drivers::i2c::EspI2cBus;
use co2fan::drivers::relay::RelayDriver;
use co2fan::drivers::watchdog::{MAX_FEED_GAP_MS, Watchdog};
use co2fan::scheduler::MeasurementScheduler;
use co2fan::sensors::{Scd40, scd40};
use co2fan::status::status_store;

/// Warm-up is slept in slices this long so the watchdog keeps being fed.
const WARMUP_SLICE_MS: u32 = 500;
const _: () = assert!((WARMUP_SLICE_MS as u64) < MAX_FEED_GAP_MS);

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Co2Fan v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration (fatal if invalid) ───────────────────
    let config = match SystemConfig::from_build_env().and_then(|raw| raw.validate()) {
        Ok(c) => c,
        Err(e) => {
            // Never run the relay on a configuration we could not check.
            error!("Configuration invalid: {}; control loop will not start", e);
            return Err(co2fan::error::Error::from(e).into());
        }
    };
    info!(
        "Config: on>{}ppm off<{}ppm interval={}ms port={} network={}",
        config.thresholds().on_ppm(),
        config.thresholds().off_ppm(),
        config.measurement_interval_ms(),
        config.http_port(),
        if config.network().is_dhcp() { "DHCP" } else { "static" }
    );

    // ── 3. Peripherals ────────────────────────────────────────
    hw_init::init_peripherals(config.hardware())?;
    let watchdog = Watchdog::new();

    let mut sensor = Scd40::new(EspI2cBus::new(), FreeRtos);
    // A previous boot may have left the sensor measuring; it ignores
    // start while already running.
    if let Err(e) = sensor.stop_periodic_measurement() {
        warn!("SCD40: stop before start failed: {}", e);
    }
    watchdog.feed();
    if let Err(e) = sensor.start_periodic_measurement() {
        // Not fatal: every cycle will report a sensor fault and hold the relay.
        error!("SCD40: start failed: {}; readings will fail until it responds", e);
    }

    let mut waited = 0;
    while waited < scd40::WARMUP_MS {
        FreeRtos::delay_ms(WARMUP_SLICE_MS);
        watchdog.feed();
        waited += WARMUP_SLICE_MS;
    }

    let mut hw = HardwareAdapter::new(sensor, RelayDriver::new(config.hardware().relay_pin));

    // ── 4. Status store + dashboard (network is non-fatal) ────
    let (publisher, reader) = status_store();

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let pins = peripherals.pins;
    let rmii = RmiiPins {
        rxd0: pins.gpio25,
        rxd1: pins.gpio26,
        crs_dv: pins.gpio27,
        txd1: pins.gpio22,
        tx_en: pins.gpio21,
        txd0: pins.gpio19,
        gpio0: pins.gpio0,
        gpio16: pins.gpio16,
        gpio17: pins.gpio17,
    };

    let mut link = match EthernetLink::start(
        peripherals.mac,
        rmii,
        &config.hardware().eth,
        &config.network(),
        sysloop,
    ) {
        Ok(link) => Some(link),
        Err(e) => {
            error!("Network unavailable: {}; running without dashboard", e);
            None
        }
    };

    let _server = if link.is_some() {
        let service = Arc::new(DashboardService::new(&config, reader));
        match start_dashboard_server(service, config.http_port()) {
            Ok(server) => Some(server),
            Err(e) => {
                error!("Network unavailable: {}; running without dashboard", e);
                None
            }
        }
    } else {
        None
    };

    // ── 5. Control loop ───────────────────────────────────────
    let controller = HysteresisController::new(config.thresholds());
    let mut scheduler =
        MeasurementScheduler::new(controller, publisher, config.measurement_interval_ms());
    let mut clock = Esp32TimeAdapter::new();
    let mut sink = LogEventSink::new();

    scheduler.run_forever(&mut hw, &mut clock, &mut sink, || {
        watchdog.feed();
        if let Some(link) = link.as_mut() {
            link.poll();
        }
    })
}
