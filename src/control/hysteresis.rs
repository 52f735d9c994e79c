//! Two-threshold (hysteresis) fan controller.
//!
//! ```text
//!            ppm > on_ppm
//!        ┌──────────────────┐
//!        │                  ▼
//!     ┌─────┐            ┌─────┐
//!     │ OFF │            │ ON  │
//!     └─────┘            └─────┘
//!        ▲                  │
//!        └──────────────────┘
//!            ppm < off_ppm
//! ```
//!
//! Readings inside `[off_ppm, on_ppm]` are the dead band: no edge exists
//! there, whichever direction the concentration approaches from.
//! Invalid samples never move the state (fail-safe hold).
//!
//! The controller only *decides*.  Driving the relay is the caller's job,
//! which keeps this module free of I/O.

use core::fmt;

use serde::Serialize;

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Validated switching thresholds.  `off_ppm < on_ppm` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Thresholds {
    on_ppm: u16,
    off_ppm: u16,
}

impl Thresholds {
    /// Build thresholds, rejecting zero values and an empty or inverted
    /// dead band.  Never swaps the arguments.
    pub fn new(on_ppm: u16, off_ppm: u16) -> Result<Self, ConfigError> {
        if on_ppm == 0 || off_ppm == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        if off_ppm >= on_ppm {
            return Err(ConfigError::InvertedThresholds { on_ppm, off_ppm });
        }
        Ok(Self { on_ppm, off_ppm })
    }

    /// Fan turns ON strictly above this concentration.
    pub fn on_ppm(&self) -> u16 {
        self.on_ppm
    }

    /// Fan turns OFF strictly below this concentration.
    pub fn off_ppm(&self) -> u16 {
        self.off_ppm
    }

    /// True if `ppm` lies in the closed dead band `[off_ppm, on_ppm]`.
    pub fn in_dead_band(&self, ppm: u16) -> bool {
        (self.off_ppm..=self.on_ppm).contains(&ppm)
    }
}

// ---------------------------------------------------------------------------
// Relay state
// ---------------------------------------------------------------------------

/// Commanded fan relay state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RelayState {
    #[default]
    Off,
    On,
}

impl RelayState {
    /// Coil level for the relay driver.
    pub fn is_energized(self) -> bool {
        matches!(self, Self::On)
    }
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "OFF"),
            Self::On => write!(f, "ON"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sample / decision
// ---------------------------------------------------------------------------

/// One measurement cycle's input.  Produced, decided on, then dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub ppm: u16,
    pub valid: bool,
}

impl Sample {
    pub fn valid(ppm: u16) -> Self {
        Self { ppm, valid: true }
    }

    /// A failed read.  The ppm field carries no information.
    pub fn invalid() -> Self {
        Self {
            ppm: 0,
            valid: false,
        }
    }
}

/// Output of [`HysteresisController::decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub state: RelayState,
    pub changed: bool,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Owns the single authoritative [`RelayState`].
#[derive(Debug, Clone)]
pub struct HysteresisController {
    thresholds: Thresholds,
    state: RelayState,
}

impl HysteresisController {
    /// Starts OFF: a high-CO2 condition has not been observed yet.
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            state: RelayState::Off,
        }
    }

    /// Feed one sample and return the resulting state.
    pub fn decide(&mut self, sample: Sample) -> Decision {
        if !sample.valid {
            return Decision {
                state: self.state,
                changed: false,
            };
        }

        let next = match self.state {
            RelayState::Off if sample.ppm > self.thresholds.on_ppm => RelayState::On,
            RelayState::On if sample.ppm < self.thresholds.off_ppm => RelayState::Off,
            unchanged => unchanged,
        };

        let changed = next != self.state;
        self.state = next;
        Decision {
            state: next,
            changed,
        }
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }
}
