//! The `ChemistryEngine` trait: the seam between parcel transport and
//! equilibrium chemistry.

use std::fmt;

use wq_core::{Composition, SolutionId};

use crate::ChemResult;

/// Concentration units the boundary recognises.
///
/// Unit strings are forwarded to the engine verbatim; [`Units::parse`] is the
/// reference table engines use to accept or reject them.  No normalization is
/// applied, so `"mg/L"` is rejected rather than read as `"mg"`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Units {
    /// Milligrams per litre.
    Mg,
    /// Millimoles per litre.
    Mmol,
    /// Moles per litre.
    Mol,
    /// Parts per million by mass (≈ mg/L for dilute water).
    Ppm,
}

impl Units {
    pub const ALL: [Units; 4] = [Units::Mg, Units::Mmol, Units::Mol, Units::Ppm];

    pub fn as_str(self) -> &'static str {
        match self {
            Units::Mg   => "mg",
            Units::Mmol => "mmol",
            Units::Mol  => "mol",
            Units::Ppm  => "ppm",
        }
    }

    /// Exact match against [`as_str`](Self::as_str); `None` for anything else.
    pub fn parse(s: &str) -> Option<Units> {
        Self::ALL.into_iter().find(|u| u.as_str() == s)
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bulk properties of a solution.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Properties {
    pub ph: f64,
    /// Specific conductance, µS/cm.
    pub conductivity: f64,
    /// Degrees Celsius.
    pub temperature: f64,
}

impl Properties {
    pub fn new(ph: f64, conductivity: f64, temperature: f64) -> Self {
        Self { ph, conductivity, temperature }
    }
}

/// An external chemistry engine that owns solutions and can blend them.
///
/// # Required methods
///
/// Every method is required; there is no sensible default for a chemistry
/// backend.  Implementations must treat handles they did not issue as
/// unknown.
///
/// # Mixing
///
/// [`mix`](Self::mix) receives a normalized [`Composition`] and returns a
/// handle to the blended solution.  It may return an existing handle (for a
/// pure composition, the contributing one) or allocate a new one; new
/// handles stay valid until passed to
/// [`remove_solutions`](Self::remove_solutions).
pub trait ChemistryEngine {
    fn mix(&mut self, composition: &Composition) -> ChemResult<SolutionId>;

    /// Total dissolved amount of `element` in `solution`, per litre.
    ///
    /// `units` is the caller's string, unmodified.
    fn total(&self, solution: SolutionId, element: &str, units: &str) -> ChemResult<f64>;

    fn properties(&self, solution: SolutionId) -> ChemResult<Properties>;

    /// Every handle currently alive, in ascending order.
    fn solution_ids(&self) -> Vec<SolutionId>;

    /// Release `ids`.  Unknown handles are ignored.
    fn remove_solutions(&mut self, ids: &[SolutionId]);
}
