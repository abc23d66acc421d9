//! Simulation time model.
//!
//! # Design
//!
//! Quality steps follow the hydraulic solution one-for-one.  A `Step` is the
//! integer index of a completed quality step; `QualityClock` pairs it with the
//! elapsed simulated seconds, which need not be a fixed multiple of the step
//! index because callers may pass a different timestep to each
//! `Simulation::step` call.

use std::fmt;

use crate::{VOLUME_EPSILON, WqError, WqResult};

// ── Step ──────────────────────────────────────────────────────────────────────

/// An absolute quality-step counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step(pub u64);

impl Step {
    pub const ZERO: Step = Step(0);

    /// Return the step `n` after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Step {
        Step(self.0 + n)
    }
}

impl std::ops::Add<u64> for Step {
    type Output = Step;
    #[inline]
    fn add(self, rhs: u64) -> Step {
        Step(self.0 + rhs)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

// ── QualityClock ──────────────────────────────────────────────────────────────

/// Tracks the number of completed steps and the simulated time they cover.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QualityClock {
    /// Number of steps completed so far.
    pub current_step: Step,
    /// Simulated seconds covered by the completed steps.
    pub elapsed_secs: f64,
}

impl QualityClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed step of `timestep_secs`.
    #[inline]
    pub fn advance(&mut self, timestep_secs: f64) {
        self.current_step = self.current_step + 1;
        self.elapsed_secs += timestep_secs;
    }

    /// Elapsed time in minutes (for reporting).
    #[inline]
    pub fn elapsed_minutes(&self) -> f64 {
        self.elapsed_secs / 60.0
    }

    /// Break elapsed time into (day, hour, minute) components.
    pub fn elapsed_dhm(&self) -> (u64, u32, u32) {
        let total_secs = self.elapsed_secs.max(0.0) as u64;
        let days = total_secs / 86_400;
        let hours = ((total_secs % 86_400) / 3_600) as u32;
        let minutes = ((total_secs % 3_600) / 60) as u32;
        (days, hours, minutes)
    }
}

impl fmt::Display for QualityClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (d, h, m) = self.elapsed_dhm();
        write!(f, "{} (day {} {:02}:{:02})", self.current_step, d, h, m)
    }
}

// ── QualityConfig ─────────────────────────────────────────────────────────────

/// Top-level configuration for a batch run.
///
/// Single-step callers only need a valid `timestep_secs`; `total_steps` and
/// `output_interval_steps` drive `Simulation::run`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QualityConfig {
    /// Seconds per quality step.  Must be positive.  Default: 3600.
    pub timestep_secs: f64,

    /// Maximum number of steps `Simulation::run` will take.
    pub total_steps: u64,

    /// Invoke the observer's snapshot hook every N steps.  0 disables it.
    pub output_interval_steps: u64,

    /// Flows (m³/s) and step volumes (m³) at or below this are treated as
    /// zero.  Default: [`VOLUME_EPSILON`].
    pub flow_epsilon: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            timestep_secs:         3_600.0,
            total_steps:           24,
            output_interval_steps: 1,
            flow_epsilon:          VOLUME_EPSILON,
        }
    }
}

impl QualityConfig {
    /// The step at which a batch run ends (exclusive upper bound).
    #[inline]
    pub fn end_step(&self) -> Step {
        Step(self.total_steps)
    }

    /// Reject configurations the engine cannot run.
    pub fn validate(&self) -> WqResult<()> {
        if self.timestep_secs <= 0.0 || !self.timestep_secs.is_finite() {
            return Err(WqError::Config(format!(
                "timestep_secs must be positive and finite, got {}",
                self.timestep_secs
            )));
        }
        if self.flow_epsilon < 0.0 || !self.flow_epsilon.is_finite() {
            return Err(WqError::Config(format!(
                "flow_epsilon must be non-negative and finite, got {}",
                self.flow_epsilon
            )));
        }
        Ok(())
    }

    /// Whether the snapshot hook fires after `step` completes.
    #[inline]
    pub fn is_output_step(&self, step: Step) -> bool {
        self.output_interval_steps > 0 && step.0.is_multiple_of(self.output_interval_steps)
    }
}
