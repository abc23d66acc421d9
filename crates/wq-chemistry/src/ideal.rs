//! `IdealMixing`: a conservative reference engine.
//!
//! Solutions are stored as element totals in mmol/L plus bulk properties.
//! Blending is linear in every total, conductivity and temperature; pH is
//! blended through hydrogen-ion activity (`−log10 Σ fᵢ·10^−pHᵢ`).  There is
//! no speciation or precipitation, which makes the engine a good fit for
//! conservative tracers and for tests.

use std::collections::BTreeMap;

use tracing::debug;
use wq_core::{Composition, SolutionId};

use crate::{ChemError, ChemResult, ChemistryEngine, Properties, Units};

/// Molar masses (g/mol) used for mass-based units.
const MOLAR_MASS: &[(&str, f64)] = &[
    ("C",  12.011),
    ("Ca", 40.078),
    ("Cl", 35.453),
    ("F",  18.998),
    ("Fe", 55.845),
    ("H",  1.008),
    ("K",  39.098),
    ("Mg", 24.305),
    ("Mn", 54.938),
    ("N",  14.007),
    ("Na", 22.990),
    ("O",  15.999),
    ("P",  30.974),
    ("S",  32.06),
    ("Si", 28.086),
];

fn molar_mass(element: &str) -> Option<f64> {
    MOLAR_MASS.iter().find(|(e, _)| *e == element).map(|(_, m)| *m)
}

/// One solution held by [`IdealMixing`].
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolutionRecord {
    /// Element totals in mmol/L.
    pub totals_mmol: BTreeMap<String, f64>,
    pub properties: Properties,
}

impl SolutionRecord {
    pub fn new(ph: f64, conductivity: f64, temperature: f64) -> Self {
        Self {
            totals_mmol: BTreeMap::new(),
            properties:  Properties::new(ph, conductivity, temperature),
        }
    }

    /// Set the total of `element` in mmol/L.
    pub fn with_total(mut self, element: &str, mmol_per_l: f64) -> Self {
        self.totals_mmol.insert(element.to_owned(), mmol_per_l);
        self
    }
}

/// A [`ChemistryEngine`] that blends solutions linearly.
///
/// # Example
///
/// ```
/// use wq_chemistry::{ChemistryEngine, IdealMixing, SolutionRecord};
/// use wq_core::Composition;
///
/// let mut engine = IdealMixing::new();
/// let hard = engine.add_solution(SolutionRecord::new(7.5, 500.0, 12.0).with_total("Ca", 2.0));
/// let soft = engine.add_solution(SolutionRecord::new(7.5, 100.0, 12.0));
///
/// let blend: Composition = [(hard, 0.5), (soft, 0.5)].into_iter().collect();
/// let id = engine.mix(&blend).unwrap();
/// assert_eq!(engine.total(id, "Ca", "mmol").unwrap(), 1.0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct IdealMixing {
    solutions: BTreeMap<SolutionId, SolutionRecord>,
    next_id:   u32,
}

impl IdealMixing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a solution and return its handle.
    ///
    /// Handles are never reused, even after removal.
    pub fn add_solution(&mut self, record: SolutionRecord) -> SolutionId {
        let id = SolutionId(self.next_id);
        self.next_id += 1;
        self.solutions.insert(id, record);
        id
    }

    pub fn get(&self, id: SolutionId) -> Option<&SolutionRecord> {
        self.solutions.get(&id)
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    fn record(&self, id: SolutionId) -> ChemResult<&SolutionRecord> {
        self.solutions.get(&id).ok_or(ChemError::UnknownSolution(id))
    }
}

impl ChemistryEngine for IdealMixing {
    fn mix(&mut self, composition: &Composition) -> ChemResult<SolutionId> {
        let weight_total = composition.total();
        if composition.is_empty() || weight_total <= 0.0 {
            return Err(ChemError::EmptyMixture);
        }

        if composition.len() == 1 {
            let (id, _) = composition.iter().next().ok_or(ChemError::EmptyMixture)?;
            self.record(id)?;
            return Ok(id);
        }

        let mut blended = SolutionRecord::default();
        let mut h_activity = 0.0;
        for (id, weight) in composition.iter() {
            let f = weight / weight_total;
            let rec = self.record(id)?;
            for (element, amount) in &rec.totals_mmol {
                *blended.totals_mmol.entry(element.clone()).or_insert(0.0) += f * amount;
            }
            h_activity += f * 10f64.powf(-rec.properties.ph);
            blended.properties.conductivity += f * rec.properties.conductivity;
            blended.properties.temperature += f * rec.properties.temperature;
        }
        blended.properties.ph = -h_activity.log10();

        let id = self.add_solution(blended);
        debug!(solution = %id, parts = composition.len(), "mixed solution");
        Ok(id)
    }

    fn total(&self, solution: SolutionId, element: &str, units: &str) -> ChemResult<f64> {
        let units = Units::parse(units).ok_or_else(|| ChemError::UnsupportedUnits(units.to_owned()))?;
        let mmol = self.record(solution)?.totals_mmol.get(element).copied().unwrap_or(0.0);
        if mmol == 0.0 {
            return Ok(0.0);
        }
        match units {
            Units::Mmol => Ok(mmol),
            Units::Mol => Ok(mmol * 1e-3),
            Units::Mg | Units::Ppm => molar_mass(element)
                .map(|m| mmol * m)
                .ok_or_else(|| ChemError::UnknownElement(element.to_owned())),
        }
    }

    fn properties(&self, solution: SolutionId) -> ChemResult<Properties> {
        Ok(self.record(solution)?.properties)
    }

    fn solution_ids(&self) -> Vec<SolutionId> {
        self.solutions.keys().copied().collect()
    }

    fn remove_solutions(&mut self, ids: &[SolutionId]) {
        for id in ids {
            self.solutions.remove(id);
        }
    }
}
