//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured controller events to
//! the ESP-IDF logger (which goes to UART in production).  One line per
//! event, tagged so the serial log can be grepped.

use log::{info, warn};

use crate::app::events::ControllerEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`ControllerEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &ControllerEvent) {
        match event {
            ControllerEvent::Started {
                thresholds,
                interval_ms,
            } => {
                info!(
                    "START | on>{}ppm off<{}ppm | interval={}ms",
                    thresholds.on_ppm(),
                    thresholds.off_ppm(),
                    interval_ms
                );
            }
            ControllerEvent::RelaySwitched { from, to, ppm } => {
                info!("RELAY | {} -> {} at {}ppm", from, to, ppm);
            }
            ControllerEvent::SensorFault(e) => {
                warn!("SENSOR | read failed: {} (holding relay)", e);
            }
            ControllerEvent::SensorRecovered { ppm } => {
                info!("SENSOR | recovered at {}ppm", ppm);
            }
            ControllerEvent::ActuatorFault { target, error } => {
                warn!("ACTUATOR | write {} failed: {} (retry next cycle)", target, error);
            }
            ControllerEvent::ActuatorRecovered(state) => {
                info!("ACTUATOR | recovered, relay {}", state);
            }
            ControllerEvent::Telemetry(s) => {
                let ppm = s.last_ppm.map_or(-1, i32::from);
                info!(
                    "TELEM | #{} t={}ms | CO2={}ppm | relay={} | sensor={} actuator={}",
                    s.cycle,
                    s.uptime_ms,
                    ppm,
                    s.relay,
                    if s.sensor_fault { "FAULT" } else { "OK" },
                    if s.actuator_fault { "FAULT" } else { "OK" },
                );
            }
        }
    }
}
