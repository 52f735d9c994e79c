//! Task watchdog (TWDT) for the control task.
//!
//! The control loop feeds from the scheduler's idle hook, so the longest
//! gap between feeds is one idle slice plus one measurement cycle.  The
//! timeout is checked at compile time to leave at least 2x headroom over
//! that gap.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use core::cell::Cell;

use log::{info, warn};

use crate::scheduler::IDLE_SLICE_MS;
use crate::sensors::scd40::READ_WORST_CASE_MS;

/// Longest the control task can go between two feeds: a full sleep slice
/// followed by a cycle whose sensor read hits every bus timeout.  The
/// relay write is a single GPIO register store and is not counted.
pub const MAX_FEED_GAP_MS: u64 = IDLE_SLICE_MS + READ_WORST_CASE_MS as u64;

/// Reset the chip if the control task is silent this long.
pub const WATCHDOG_TIMEOUT_MS: u32 = 10_000;

const _: () = assert!(MAX_FEED_GAP_MS * 2 < WATCHDOG_TIMEOUT_MS as u64);

/// Subscription of the calling task to the TWDT.
pub struct Watchdog {
    armed: bool,
    feeds: Cell<u32>,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl Watchdog {
    /// Subscribe the current task.  A failed subscription is logged and the
    /// firmware runs unsupervised rather than refusing to boot.
    pub fn new() -> Self {
        let armed = match subscribe_current_task(WATCHDOG_TIMEOUT_MS) {
            Ok(()) => {
                info!(
                    "Watchdog: armed, {}ms timeout (max feed gap {}ms)",
                    WATCHDOG_TIMEOUT_MS, MAX_FEED_GAP_MS
                );
                true
            }
            Err(rc) => {
                warn!("Watchdog: not armed (rc={})", rc);
                false
            }
        };
        Self {
            armed,
            feeds: Cell::new(0),
        }
    }

    pub fn feed(&self) {
        self.feeds.set(self.feeds.get().wrapping_add(1));
        if self.armed {
            reset_task_timer();
        }
    }

    /// Whether the hardware timer supervises this task.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Feeds since boot (wraps).
    pub fn feed_count(&self) -> u32 {
        self.feeds.get()
    }
}

#[cfg(target_os = "espidf")]
fn subscribe_current_task(timeout_ms: u32) -> Result<(), i32> {
    let cfg = esp_task_wdt_config_t {
        timeout_ms,
        idle_core_mask: 0,
        trigger_panic: true,
    };
    // SAFETY: called once from the main task during boot; `cfg` outlives
    // the call.
    let ret = unsafe { esp_task_wdt_reconfigure(&cfg) };
    if ret != ESP_OK {
        // Already initialised by the bootloader config; keep going.
        warn!("Watchdog: reconfigure returned {}", ret);
    }
    // SAFETY: null subscribes the calling task.
    let ret = unsafe { esp_task_wdt_add(core::ptr::null_mut()) };
    if ret == ESP_OK { Ok(()) } else { Err(ret) }
}

#[cfg(not(target_os = "espidf"))]
fn subscribe_current_task(_timeout_ms: u32) -> Result<(), i32> {
    Err(-1)
}

#[cfg(target_os = "espidf")]
fn reset_task_timer() {
    // SAFETY: only reached when the calling task is subscribed.
    unsafe {
        esp_task_wdt_reset();
    }
}

#[cfg(not(target_os = "espidf"))]
fn reset_task_timer() {}
