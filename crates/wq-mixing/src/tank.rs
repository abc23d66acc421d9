//! Persistent tank state.

use std::collections::VecDeque;

use wq_core::{Composition, Load, VOLUME_EPSILON};
use wq_network::TankMixing;

use crate::merge_load;

// ── CSTR ──────────────────────────────────────────────────────────────────────

/// A completely mixed tank.
///
/// The contents relax toward the inflow composition:
///
/// ```text
/// k   = exp(−V_in / V_tank)
/// new = inflow · (1 − k) + old · k
/// ```
///
/// The water leaving during the step is the average of the contents before
/// and after, which approximates the time-integral of the outlet quality.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CstrTank {
    /// Stored volume, m³.
    pub volume: f64,
    pub mixture: Composition,
}

impl CstrTank {
    pub fn new(volume: f64) -> Self {
        Self { volume, mixture: Composition::new() }
    }

    pub fn fill(&mut self, composition: &Composition) {
        self.mixture = composition.clone();
    }

    /// Blend one step of inflow into the tank and return the composition
    /// that leaves (empty if the tank has never held water).
    ///
    /// `tank_volume` overrides the tracked volume when the hydraulic
    /// snapshot supplies it; otherwise the volume is updated by the step's
    /// net flow.
    pub fn mix(
        &mut self,
        inflow:      &Composition,
        inflow_vol:  f64,
        outflow_vol: f64,
        tank_volume: Option<f64>,
    ) -> Composition {
        let volume = tank_volume.unwrap_or(self.volume);

        if inflow_vol <= VOLUME_EPSILON || inflow.is_empty() {
            self.volume = tank_volume.unwrap_or((volume - outflow_vol).max(0.0));
            return self.mixture.clone();
        }

        let old = std::mem::take(&mut self.mixture);
        let new = if old.is_empty() {
            inflow.clone()
        } else {
            let k = if volume > VOLUME_EPSILON { (-inflow_vol / volume).exp() } else { 0.0 };
            merge_load(&merge_load(&Composition::new(), inflow, 1.0 - k), &old, k).normalized()
        };

        let emitted = if old.is_empty() {
            new.clone()
        } else {
            merge_load(&merge_load(&Composition::new(), &old, 0.5), &new, 0.5).normalized()
        };

        self.mixture = new;
        self.volume = tank_volume.unwrap_or((volume + inflow_vol - outflow_vol).max(0.0));
        emitted
    }
}

// ── FIFO / LIFO ───────────────────────────────────────────────────────────────

/// Which end of a layered tank drains first.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Discipline {
    /// Oldest water leaves first (plug flow).
    Fifo,
    /// Newest water leaves first (stratified).
    Lifo,
}

impl Discipline {
    pub fn from_mixing(mixing: TankMixing) -> Option<Discipline> {
        match mixing {
            TankMixing::Cstr => None,
            TankMixing::Fifo => Some(Discipline::Fifo),
            TankMixing::Lifo => Some(Discipline::Lifo),
        }
    }
}

/// A tank that keeps inflow as unmixed volume layers.
///
/// `layers` runs oldest (front) to newest (back).
#[derive(Clone, Debug, PartialEq)]
pub struct LayeredTank {
    pub discipline: Discipline,
    pub layers:     VecDeque<Load>,
    /// Volume used by [`fill`](Self::fill), m³.
    pub initial_volume: f64,
}

impl LayeredTank {
    pub fn new(discipline: Discipline, initial_volume: f64) -> Self {
        Self { discipline, layers: VecDeque::new(), initial_volume }
    }

    pub fn fill(&mut self, composition: &Composition) {
        self.layers.clear();
        if self.initial_volume > VOLUME_EPSILON {
            self.layers.push_back(Load::new(self.initial_volume, composition.clone()));
        }
    }

    pub fn stored_volume(&self) -> f64 {
        self.layers.iter().map(|l| l.volume).sum()
    }

    /// Store an inlet-first load sequence.  The last entry arrived first, so
    /// it becomes the oldest new layer.
    pub fn add(&mut self, inflow: &[Load]) {
        for load in inflow.iter().rev().filter(|l| l.volume > 0.0) {
            self.layers.push_back(load.clone());
        }
    }

    /// Remove up to `volume` m³ and return it inlet-first.
    ///
    /// Layers are drawn in exit order (FIFO from the front, LIFO from the
    /// back); a partly drawn layer keeps its remainder.  Draws more than the
    /// stored volume return everything.
    pub fn draw(&mut self, volume: f64) -> Vec<Load> {
        let from_front = self.discipline == Discipline::Fifo;
        let mut drawn = Vec::new();
        let mut remaining = volume;

        while remaining > VOLUME_EPSILON {
            let next = if from_front { self.layers.front_mut() } else { self.layers.back_mut() };
            let Some(layer) = next else { break };

            if layer.volume > remaining + VOLUME_EPSILON {
                layer.volume -= remaining;
                drawn.push(Load::new(remaining, layer.composition.clone()));
                break;
            }
            remaining -= layer.volume;
            let whole = if from_front { self.layers.pop_front() } else { self.layers.pop_back() };
            drawn.extend(whole);
        }

        drawn.reverse();
        drawn
    }
}
