//! Latest-value status store shared between the control loop and the
//! dashboard.
//!
//! ```text
//!  MeasurementScheduler ──publish()──▶ ┌────────────┐ ──latest()──▶ HTTP handlers
//!     (StatusPublisher)                │ StatusCell │     (StatusReader, Clone)
//!                                      └────────────┘
//! ```
//!
//! The snapshot is a small `Copy` value swapped whole inside an
//! embassy-sync critical-section mutex, so readers never see a torn
//! update and the writer is never held up for more than a copy.
//! Only one [`StatusPublisher`] exists; it is not `Clone`.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use serde::Serialize;
use std::sync::Arc;

use crate::control::RelayState;

/// Point-in-time controller state as seen by observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    /// Milliseconds since boot at the start of the cycle that produced this.
    pub uptime_ms: u64,
    /// Completed measurement cycles since boot (0 = none yet).
    pub cycle: u64,
    /// Last valid CO2 reading; `None` until the first good sample.
    pub last_ppm: Option<u16>,
    /// Relay state commanded by the controller.
    pub relay: RelayState,
    /// The most recent sample was invalid.
    pub sensor_fault: bool,
    /// The relay output may not match `relay` (last write failed).
    pub actuator_fault: bool,
}

impl StatusSnapshot {
    /// Power-on defaults: relay OFF, concentration unknown.
    pub const BOOT: Self = Self {
        uptime_ms: 0,
        cycle: 0,
        last_ppm: None,
        relay: RelayState::Off,
        sensor_fault: false,
        actuator_fault: false,
    };
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self::BOOT
    }
}

struct StatusCell {
    inner: Mutex<CriticalSectionRawMutex, Cell<StatusSnapshot>>,
}

/// Create the store and hand out its two ends.
pub fn status_store() -> (StatusPublisher, StatusReader) {
    let cell = Arc::new(StatusCell {
        inner: Mutex::new(Cell::new(StatusSnapshot::BOOT)),
    });
    (
        StatusPublisher {
            cell: Arc::clone(&cell),
        },
        StatusReader { cell },
    )
}

/// Write end, owned by the measurement scheduler.
pub struct StatusPublisher {
    cell: Arc<StatusCell>,
}

impl StatusPublisher {
    /// Replace the snapshot atomically.
    pub fn publish(&self, snapshot: StatusSnapshot) {
        self.cell.inner.lock(|c| c.set(snapshot));
    }

    /// What was last published.
    pub fn current(&self) -> StatusSnapshot {
        self.cell.inner.lock(Cell::get)
    }
}

/// Read end, cloned into every dashboard handler.
#[derive(Clone)]
pub struct StatusReader {
    cell: Arc<StatusCell>,
}

impl StatusReader {
    pub fn latest(&self) -> StatusSnapshot {
        self.cell.inner.lock(Cell::get)
    }
}
