//! Read-only concentration, mixture and property queries over the most
//! recently completed step.

use wq_chemistry::{ChemistryEngine, Properties};
use wq_core::{Composition, LinkId, Load, NodeId, Parcel};
use wq_network::Network;

use crate::{Registry, SimResult};

/// Concentration of one parcel in a link profile.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct ParcelConc {
    pub x0: f64,
    pub x1: f64,
    pub conc: f64,
}

/// Query view over a [`Simulation`](crate::Simulation).
///
/// Instantaneous queries read the inlet-most water: the first mixed parcel
/// of a node, or the first parcel of a link.  `_avg` queries weight every
/// parcel that passed through during the last step by volume; each parcel's
/// composition is resolved by the engine before averaging, except for
/// mixtures, which are averaged directly.
///
/// No data means a zero or empty result, never an error.  Unknown ids and
/// engine failures are errors.
pub struct Quality<'a, E: ChemistryEngine> {
    network:  &'a Network,
    registry: &'a Registry,
    engine:   &'a mut E,
}

impl<'a, E: ChemistryEngine> Quality<'a, E> {
    pub fn new(network: &'a Network, registry: &'a Registry, engine: &'a mut E) -> Self {
        Self { network, registry, engine }
    }

    pub fn network(&self) -> &Network {
        self.network
    }

    pub fn registry(&self) -> &Registry {
        self.registry
    }

    // ── Nodes ─────────────────────────────────────────────────────────────

    pub fn conc_node(&mut self, node: NodeId, element: &str, units: &str) -> SimResult<f64> {
        let registry = self.registry;
        match registry.node(node)?.mixed_parcels.first() {
            Some(load) => self.total(&load.composition, element, units),
            None => Ok(0.0),
        }
    }

    pub fn conc_node_avg(&mut self, node: NodeId, element: &str, units: &str) -> SimResult<f64> {
        let registry = self.registry;
        let loads = &registry.node(node)?.mixed_parcels;
        self.average(loads, |q, c| q.total(c, element, units))
    }

    pub fn mixture_node(&self, node: NodeId) -> SimResult<Composition> {
        Ok(self
            .registry
            .node(node)?
            .mixed_parcels
            .first()
            .map(|l| l.composition.clone())
            .unwrap_or_default())
    }

    /// Volume-weighted blend of everything the node released last step.
    pub fn mixture_node_avg(&self, node: NodeId) -> SimResult<Composition> {
        let loads = &self.registry.node(node)?.mixed_parcels;
        let weights = volume_weights(loads);
        let mut acc = Composition::new();
        for (load, w) in loads.iter().zip(weights) {
            acc.add_weighted(&load.composition, w);
        }
        Ok(acc.normalized())
    }

    pub fn properties_node(&mut self, node: NodeId) -> SimResult<Properties> {
        let registry = self.registry;
        match registry.node(node)?.mixed_parcels.first() {
            Some(load) => self.properties(&load.composition),
            None => Ok(Properties::default()),
        }
    }

    pub fn properties_node_avg(&mut self, node: NodeId) -> SimResult<Properties> {
        let registry = self.registry;
        let loads = &registry.node(node)?.mixed_parcels;
        let mut avg = Properties::default();
        for (load, w) in loads.iter().zip(volume_weights(loads)) {
            let p = self.properties(&load.composition)?;
            avg.ph += p.ph * w;
            avg.conductivity += p.conductivity * w;
            avg.temperature += p.temperature * w;
        }
        Ok(avg)
    }

    // ── Links ─────────────────────────────────────────────────────────────

    /// Concentration at the inlet end of `link`.
    ///
    /// Pumps and valves hold no parcels; for them this reads the first load
    /// that passed through last step.
    pub fn conc_link(&mut self, link: LinkId, element: &str, units: &str) -> SimResult<f64> {
        let registry = self.registry;
        let model = registry.link(link)?;
        let first = model
            .state
            .first()
            .map(|p| &p.composition)
            .or_else(|| model.output_state.first().map(|l| &l.composition));
        match first {
            Some(c) => self.total(c, element, units),
            None => Ok(0.0),
        }
    }

    /// Per-parcel concentration along `link`, inlet first.
    pub fn conc_link_profile(
        &mut self,
        link:    LinkId,
        element: &str,
        units:   &str,
    ) -> SimResult<Vec<ParcelConc>> {
        let registry = self.registry;
        registry
            .link(link)?
            .state
            .iter()
            .map(|p| {
                Ok(ParcelConc { x0: p.x0, x1: p.x1, conc: self.total(&p.composition, element, units)? })
            })
            .collect()
    }

    /// Content-averaged concentration of `link`.
    ///
    /// Pipes weight each parcel by its span; pumps and valves average what
    /// passed through last step by volume.
    pub fn conc_link_avg(&mut self, link: LinkId, element: &str, units: &str) -> SimResult<f64> {
        let registry = self.registry;
        let model = registry.link(link)?;
        if model.is_zero_length() {
            return self.average(&model.output_state, |q, c| q.total(c, element, units));
        }
        let mut acc = 0.0;
        for p in &model.state {
            acc += self.total(&p.composition, element, units)? * p.span();
        }
        Ok(acc)
    }

    pub fn parcels(&self, link: LinkId) -> SimResult<&'a [Parcel]> {
        let registry = self.registry;
        Ok(&registry.link(link)?.state)
    }

    // ── Engine plumbing ───────────────────────────────────────────────────

    fn total(&mut self, composition: &Composition, element: &str, units: &str) -> SimResult<f64> {
        if composition.is_empty() {
            return Ok(0.0);
        }
        let id = self.engine.mix(composition)?;
        Ok(self.engine.total(id, element, units)?)
    }

    fn properties(&mut self, composition: &Composition) -> SimResult<Properties> {
        if composition.is_empty() {
            return Ok(Properties::default());
        }
        let id = self.engine.mix(composition)?;
        Ok(self.engine.properties(id)?)
    }

    fn average(
        &mut self,
        loads:   &[Load],
        mut eval: impl FnMut(&mut Self, &Composition) -> SimResult<f64>,
    ) -> SimResult<f64> {
        let mut acc = 0.0;
        for (load, w) in loads.iter().zip(volume_weights(loads)) {
            acc += eval(self, &load.composition)? * w;
        }
        Ok(acc)
    }
}

/// Volume share of each load.  Equal shares when the total is not positive.
fn volume_weights(loads: &[Load]) -> Vec<f64> {
    let total: f64 = loads.iter().map(|l| l.volume.max(0.0)).sum();
    if total > 0.0 {
        loads.iter().map(|l| l.volume.max(0.0) / total).collect()
    } else {
        vec![1.0 / loads.len().max(1) as f64; loads.len()]
    }
}
