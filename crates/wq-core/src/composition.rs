//! Fractional mixtures of chemistry-engine solutions.
//!
//! A [`Composition`] maps each contributing [`SolutionId`] to the volume
//! fraction it makes up.  Compositions attached to parcels always sum to 1
//! within [`FRACTION_TOLERANCE`]; intermediate accumulators built by
//! [`Composition::add_weighted`] hold absolute volumes until normalized.
//!
//! Storage is a `BTreeMap` so iteration order (and therefore every derived
//! floating-point sum) is deterministic across runs.

use std::collections::BTreeMap;

use crate::SolutionId;

/// Allowed deviation of a normalized composition's fraction sum from 1.
pub const FRACTION_TOLERANCE: f64 = 1e-6;

/// Fractions below this are dropped by [`Composition::normalized`].
const PRUNE_BELOW: f64 = 1e-12;

/// Mapping `SolutionId → fraction` describing a blended water.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Composition(BTreeMap<SolutionId, f64>);

impl Composition {
    /// An empty composition (no water).
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// 100 % of a single solution.
    pub fn pure(solution: SolutionId) -> Self {
        let mut map = BTreeMap::new();
        map.insert(solution, 1.0);
        Self(map)
    }

    /// Fraction of `solution` in this mixture (`0.0` if absent).
    #[inline]
    pub fn get(&self, solution: SolutionId) -> f64 {
        self.0.get(&solution).copied().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `(solution, fraction)` pairs in ascending solution order.
    pub fn iter(&self) -> impl Iterator<Item = (SolutionId, f64)> + '_ {
        self.0.iter().map(|(&id, &frac)| (id, frac))
    }

    /// The solution handles this mixture references.
    pub fn solutions(&self) -> impl Iterator<Item = SolutionId> + '_ {
        self.0.keys().copied()
    }

    /// Sum of all fractions (or volumes, for an accumulator).
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// `true` when the fractions sum to 1 within [`FRACTION_TOLERANCE`].
    pub fn is_normalized(&self) -> bool {
        (self.total() - 1.0).abs() <= FRACTION_TOLERANCE
    }

    /// Add `weight × other` into `self`, entry by entry.
    ///
    /// This is the volume-weighted accumulation step used by every mixing
    /// model; the result is generally not normalized.
    pub fn add_weighted(&mut self, other: &Composition, weight: f64) {
        for (id, frac) in other.iter() {
            *self.0.entry(id).or_insert(0.0) += frac * weight;
        }
    }

    /// Scale to a fraction sum of 1, dropping negligible entries.
    ///
    /// Returns an empty composition if the total is not positive.
    pub fn normalized(mut self) -> Self {
        let total = self.total();
        if total <= 0.0 {
            return Self::new();
        }
        self.0.retain(|_, v| *v / total > PRUNE_BELOW);
        let kept = self.total();
        for v in self.0.values_mut() {
            *v /= kept;
        }
        self
    }

    /// Entry-wise comparison within `tol`, treating missing entries as zero.
    pub fn approx_eq(&self, other: &Composition, tol: f64) -> bool {
        self.0
            .keys()
            .chain(other.0.keys())
            .all(|&id| (self.get(id) - other.get(id)).abs() <= tol)
    }
}

impl FromIterator<(SolutionId, f64)> for Composition {
    /// Collect raw `(solution, fraction)` pairs; duplicate ids are summed.
    fn from_iter<T: IntoIterator<Item = (SolutionId, f64)>>(iter: T) -> Self {
        let mut map = BTreeMap::new();
        for (id, frac) in iter {
            *map.entry(id).or_insert(0.0) += frac;
        }
        Self(map)
    }
}
