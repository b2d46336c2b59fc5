//! Tunable parameters for the intersection simulation
//!
//! Defaults reproduce the reference timing: a 100 tick green that can grow
//! to 500 ticks under congestion, with a 60 tick bound on waiting for the
//! intersection to clear.

use anyhow::{ensure, Result};

/// Base green duration in ticks
pub const PHASE_DURATION_TICKS: u32 = 100;

/// Maximum extension added on top of the base duration
pub const MAX_PHASE_EXTENSION_TICKS: u32 = 400;

/// Ticks of green added per unit of congestion ratio
pub const DURATION_GAIN: f64 = 200.0;

/// Ticks of green added per vehicle queued beyond lane capacity
pub const OVERFLOW_EXTENSION_TICKS: u32 = 50;

/// Ticks a pending phase may wait for the intersection before it is forced
pub const PENDING_TIMEOUT_TICKS: u32 = 60;

/// Ticks of denied demand after which a lane preempts the current phase
pub const STARVATION_THRESHOLD_TICKS: u32 = 720;

/// Maximum number of vehicles alive at once
pub const MAX_VEHICLES: usize = 28;

/// Spawn is refused while a same-lane vehicle is this close to the entry
pub const MIN_SPAWN_DISTANCE: i32 = 80;

/// Signal timing parameters used by the phase scheduler
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalTiming {
    pub base_duration: u32,
    pub max_extension: u32,
    pub duration_gain: f64,
    pub overflow_step: u32,
    pub pending_timeout: u32,
    pub starvation_threshold: u32,
}

impl Default for SignalTiming {
    fn default() -> Self {
        Self {
            base_duration: PHASE_DURATION_TICKS,
            max_extension: MAX_PHASE_EXTENSION_TICKS,
            duration_gain: DURATION_GAIN,
            overflow_step: OVERFLOW_EXTENSION_TICKS,
            pending_timeout: PENDING_TIMEOUT_TICKS,
            starvation_threshold: STARVATION_THRESHOLD_TICKS,
        }
    }
}

impl SignalTiming {
    /// Hard upper bound on any phase duration
    pub fn max_duration(&self) -> u32 {
        self.base_duration.saturating_add(self.max_extension)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.base_duration > 0, "base duration must be positive");
        ensure!(self.pending_timeout > 0, "pending timeout must be positive");
        ensure!(
            self.duration_gain.is_finite() && self.duration_gain >= 0.0,
            "duration gain must be finite and non-negative, got {}",
            self.duration_gain
        );
        ensure!(
            self.starvation_threshold >= self.base_duration,
            "starvation threshold ({}) must be at least the base duration ({})",
            self.starvation_threshold,
            self.base_duration
        );
        Ok(())
    }
}

/// Full configuration of a simulation world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimConfig {
    pub timing: SignalTiming,
    pub max_vehicles: usize,
    pub spawn_clearance: i32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            timing: SignalTiming::default(),
            max_vehicles: MAX_VEHICLES,
            spawn_clearance: MIN_SPAWN_DISTANCE,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<()> {
        self.timing.validate()?;
        ensure!(self.max_vehicles > 0, "max vehicles must be positive");
        ensure!(
            self.spawn_clearance >= 0,
            "spawn clearance must not be negative, got {}",
            self.spawn_clearance
        );
        Ok(())
    }
}
