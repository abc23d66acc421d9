//! The `NodeModel`: per-node mixing state and dispatch.

use tracing::debug;
use wq_core::{Composition, Load, NodeId, VOLUME_EPSILON, WqError, WqResult, total_volume};
use wq_network::{NodeKind, TankMixing};

use crate::{CstrTank, Discipline, LayeredTank, merge_loads, parcels_out};

/// Everything a node needs to mix one step.
#[derive(Clone, Copy, Debug)]
pub struct MixInput<'a> {
    pub node: NodeId,

    /// Concatenated `output_state` of every upstream link, inlet-first.
    pub inflow: &'a [Load],

    /// Consumer demand, m³/s.
    pub demand: f64,

    pub timestep_secs: f64,

    /// `|flow|` (m³/s) of each downstream link, in the order the outflow
    /// allocation should follow.
    pub outflows: &'a [f64],

    /// Source composition (reservoirs only).
    pub source: Option<&'a Composition>,

    /// Current stored volume reported by the hydraulics (tanks only).
    pub tank_volume: Option<f64>,
}

impl MixInput<'_> {
    /// Total volume leaving through downstream links this step, m³.
    pub fn outflow_volume(&self) -> f64 {
        self.outflows.iter().sum::<f64>() * self.timestep_secs
    }
}

/// Node variant with its persistent state.
#[derive(Clone, Debug, PartialEq)]
pub enum Mixer {
    /// Instantaneous complete mixing; demand is withdrawn.
    Junction,
    /// Unconstrained source.
    Reservoir,
    TankCstr(CstrTank),
    /// Covers both FIFO and LIFO tanks.
    TankLayered(LayeredTank),
}

impl Mixer {
    pub fn for_kind(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Junction => Mixer::Junction,
            NodeKind::Reservoir => Mixer::Reservoir,
            NodeKind::Tank { initial_volume_m3, mixing } => match Discipline::from_mixing(mixing) {
                Some(discipline) => Mixer::TankLayered(LayeredTank::new(discipline, initial_volume_m3)),
                None => Mixer::TankCstr(CstrTank::new(initial_volume_m3)),
            },
        }
    }

    pub fn tank_mixing(&self) -> Option<TankMixing> {
        match self {
            Mixer::Junction | Mixer::Reservoir => None,
            Mixer::TankCstr(_) => Some(TankMixing::Cstr),
            Mixer::TankLayered(t) => Some(match t.discipline {
                Discipline::Fifo => TankMixing::Fifo,
                Discipline::Lifo => TankMixing::Lifo,
            }),
        }
    }
}

/// Mixing state for one node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeModel {
    pub mixer: Mixer,

    /// Water that left the node during the last step, inlet-first.
    /// Usually one entry; layered tanks may emit several.
    pub mixed_parcels: Vec<Load>,

    /// `mixed_parcels` split per downstream link.  Empty when the node had
    /// no meaningful outgoing flow.
    pub outflow: Vec<Vec<Load>>,
}

impl NodeModel {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            mixer:         Mixer::for_kind(kind),
            mixed_parcels: Vec::new(),
            outflow:       Vec::new(),
        }
    }

    pub fn is_reservoir(&self) -> bool {
        matches!(self.mixer, Mixer::Reservoir)
    }

    pub fn is_tank(&self) -> bool {
        matches!(self.mixer, Mixer::TankCstr(_) | Mixer::TankLayered(_))
    }

    /// Seed the node for queries made before the first step.
    ///
    /// Tanks also take `composition` as their initial contents.
    pub fn fill(&mut self, composition: &Composition) {
        self.mixed_parcels = vec![Load::new(0.0, composition.clone())];
        self.outflow.clear();
        match &mut self.mixer {
            Mixer::TankCstr(tank) => tank.fill(composition),
            Mixer::TankLayered(tank) => tank.fill(composition),
            Mixer::Junction | Mixer::Reservoir => {}
        }
    }

    /// Mix one step and recompute the outflow allocation.
    ///
    /// # Errors
    ///
    /// [`WqError::MissingSource`] for a reservoir without a source
    /// composition.  Nothing is modified in that case.
    pub fn mix(&mut self, input: &MixInput<'_>) -> WqResult<()> {
        let dt = input.timestep_secs;

        let mixed = match &mut self.mixer {
            Mixer::Junction => {
                let (composition, volume) = merge_loads(input.inflow);
                if volume <= VOLUME_EPSILON {
                    Vec::new()
                } else {
                    let net = (volume - input.demand * dt).max(0.0);
                    vec![Load::new(net, composition)]
                }
            }
            Mixer::Reservoir => {
                let source = input.source.ok_or(WqError::MissingSource(input.node))?;
                vec![Load::new(input.outflow_volume(), source.clone())]
            }
            Mixer::TankCstr(tank) => {
                let (composition, volume) = merge_loads(input.inflow);
                let out_vol = input.outflow_volume();
                let emitted = tank.mix(&composition, volume, out_vol, input.tank_volume);
                if emitted.is_empty() {
                    Vec::new()
                } else {
                    vec![Load::new(out_vol, emitted)]
                }
            }
            Mixer::TankLayered(tank) => {
                tank.add(input.inflow);
                tank.draw(input.outflow_volume())
            }
        };

        self.outflow = parcels_out(&mixed, input.outflows);
        if self.outflow.is_empty() && total_volume(&mixed) > VOLUME_EPSILON {
            debug!(node = %input.node, "near-zero outgoing flow, outflow not allocated");
        }
        self.mixed_parcels = mixed;
        Ok(())
    }

    /// Every composition this node holds, for reachability scans.
    pub fn compositions(&self) -> impl Iterator<Item = &Composition> + '_ {
        let tank: Box<dyn Iterator<Item = &Composition> + '_> = match &self.mixer {
            Mixer::TankCstr(t) => Box::new(std::iter::once(&t.mixture)),
            Mixer::TankLayered(t) => Box::new(t.layers.iter().map(|l| &l.composition)),
            Mixer::Junction | Mixer::Reservoir => Box::new(std::iter::empty()),
        };
        self.mixed_parcels
            .iter()
            .chain(self.outflow.iter().flatten())
            .map(|l| &l.composition)
            .chain(tank)
    }
}
