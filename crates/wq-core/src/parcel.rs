//! Water parcels and volume-carrying loads.
//!
//! A [`Parcel`] is a positioned slice of a link, with `x0`/`x1` normalized to
//! the link volume (`0` = inlet, `1` = outlet).  A [`Load`] is position-free:
//! a volume of water and its composition, used for everything that crosses a
//! node (inflow, outflow, mixed output).
//!
//! # Load ordering
//!
//! Every `Vec<Load>` exchanged between models is ordered **inlet-first**:
//! index 0 is the water released most recently.  Pushing such a sequence into
//! a pipe lays it out from `x = 0` in list order, so the oldest water ends up
//! deepest.

use crate::Composition;

/// Volumes (m³) and normalized lengths below this are treated as zero.
pub const VOLUME_EPSILON: f64 = 1e-7;

/// A contiguous segment of water inside a link.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Parcel {
    /// Normalized start position, in `[0, 1]`.
    pub x0: f64,
    /// Normalized end position, in `[0, 1]`, always `> x0`.
    pub x1: f64,
    pub composition: Composition,
}

impl Parcel {
    pub fn new(x0: f64, x1: f64, composition: Composition) -> Self {
        Self { x0, x1, composition }
    }

    /// Normalized length `x1 - x0`.
    #[inline]
    pub fn span(&self) -> f64 {
        self.x1 - self.x0
    }
}

/// A volume of water with a single blended composition.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Load {
    /// Volume in m³.
    pub volume: f64,
    pub composition: Composition,
}

impl Load {
    pub fn new(volume: f64, composition: Composition) -> Self {
        Self { volume, composition }
    }
}

/// Sum of `volume` over a load sequence.
pub fn total_volume(loads: &[Load]) -> f64 {
    loads.iter().map(|l| l.volume).sum()
}
