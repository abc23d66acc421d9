//! Per-step hydraulic results consumed by the quality engine.

use wq_core::{LinkId, NodeId, WqError, WqResult};

use crate::Network;

/// Flow-consistent direction of a link for one step.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Orientation {
    pub upstream:   NodeId,
    pub downstream: NodeId,
}

impl Orientation {
    pub fn new(upstream: NodeId, downstream: NodeId) -> Self {
        Self { upstream, downstream }
    }

    #[inline]
    pub fn reversed(self) -> Self {
        Self { upstream: self.downstream, downstream: self.upstream }
    }
}

/// Flow, demand and tank volume for every element at one hydraulic step.
///
/// Rates are in m³/s; the volume moved during a quality step is
/// `rate × timestep_secs`.  Sizes match the [`Network`] the snapshot was
/// created for; [`validate`](Self::validate) checks this.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HydraulicSnapshot {
    /// Signed flow per link.  Positive runs `link_from → link_to`.
    pub flows: Vec<f64>,
    /// Consumer demand per node, removed from the node's outgoing volume.
    pub demands: Vec<f64>,
    /// Current stored volume per node (tanks only; `None` elsewhere).
    pub tank_volumes: Vec<Option<f64>>,
}

impl HydraulicSnapshot {
    /// An all-zero snapshot sized for `network`.
    pub fn new(network: &Network) -> Self {
        Self {
            flows:        vec![0.0; network.link_count()],
            demands:      vec![0.0; network.node_count()],
            tank_volumes: vec![None; network.node_count()],
        }
    }

    pub fn set_flow(&mut self, link: LinkId, flow_m3s: f64) -> WqResult<()> {
        let slot = self.flows.get_mut(link.index()).ok_or(WqError::LinkNotFound(link))?;
        *slot = flow_m3s;
        Ok(())
    }

    pub fn set_demand(&mut self, node: NodeId, demand_m3s: f64) -> WqResult<()> {
        let slot = self.demands.get_mut(node.index()).ok_or(WqError::NodeNotFound(node))?;
        *slot = demand_m3s;
        Ok(())
    }

    pub fn set_tank_volume(&mut self, node: NodeId, volume_m3: f64) -> WqResult<()> {
        let slot = self.tank_volumes.get_mut(node.index()).ok_or(WqError::NodeNotFound(node))?;
        *slot = Some(volume_m3);
        Ok(())
    }

    /// Signed flow of `link` (0 if out of range).
    #[inline]
    pub fn flow(&self, link: LinkId) -> f64 {
        self.flows.get(link.index()).copied().unwrap_or(0.0)
    }

    /// Demand at `node` (0 if out of range).
    #[inline]
    pub fn demand(&self, node: NodeId) -> f64 {
        self.demands.get(node.index()).copied().unwrap_or(0.0)
    }

    pub fn tank_volume(&self, node: NodeId) -> Option<f64> {
        self.tank_volumes.get(node.index()).copied().flatten()
    }

    /// Check the snapshot matches `network`'s element counts and holds only
    /// finite values.
    pub fn validate(&self, network: &Network) -> WqResult<()> {
        if self.flows.len() != network.link_count() {
            return Err(WqError::Config(format!(
                "snapshot has {} link flows, network has {} links",
                self.flows.len(),
                network.link_count()
            )));
        }
        if self.demands.len() != network.node_count()
            || self.tank_volumes.len() != network.node_count()
        {
            return Err(WqError::Config(format!(
                "snapshot node tables do not match network ({} nodes)",
                network.node_count()
            )));
        }
        if let Some(i) = self.flows.iter().position(|f| !f.is_finite()) {
            return Err(WqError::Config(format!(
                "non-finite flow on {}",
                LinkId(i as u32)
            )));
        }
        if let Some(i) = self.demands.iter().position(|d| !d.is_finite()) {
            return Err(WqError::Config(format!(
                "non-finite demand at {}",
                NodeId(i as u32)
            )));
        }
        Ok(())
    }

    /// The direction `link` runs in this snapshot.
    ///
    /// Positive flow follows the nominal direction, negative flow reverses
    /// it, and exactly zero flow keeps `previous`.
    pub fn orientation(
        &self,
        network:  &Network,
        link:     LinkId,
        previous: Orientation,
    ) -> WqResult<Orientation> {
        let (from, to) = network.endpoints(link)?;
        let flow = self.flow(link);
        Ok(if flow > 0.0 {
            Orientation::new(from, to)
        } else if flow < 0.0 {
            Orientation::new(to, from)
        } else {
            previous
        })
    }
}
