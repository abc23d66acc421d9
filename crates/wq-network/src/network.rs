//! Network element tables and builder.
//!
//! # Data layout
//!
//! Elements are stored as parallel arrays indexed by `NodeId` / `LinkId`.
//! Each link has a **nominal** direction `link_from → link_to`; a positive
//! flow in a [`HydraulicSnapshot`](crate::HydraulicSnapshot) runs along it,
//! a negative flow against it.
//!
//! Pumps and valves are modelled as zero-length links: they carry water
//! between nodes within a step but store none.

use std::f64::consts::PI;

use wq_core::{LinkId, NodeId, WqError, WqResult};

// ── Element kinds ─────────────────────────────────────────────────────────────

/// How a tank blends the water it stores.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TankMixing {
    /// Complete, continuous mixing.
    #[default]
    Cstr,
    /// Plug flow: first in, first out.
    Fifo,
    /// Stratified: last in, first out.
    Lifo,
}

#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    Junction,
    /// Unconstrained source with a caller-supplied solution.
    Reservoir,
    Tank {
        /// Stored volume at the start of the simulation, m³.
        initial_volume_m3: f64,
        mixing:            TankMixing,
    },
}

impl NodeKind {
    pub fn is_reservoir(self) -> bool {
        matches!(self, NodeKind::Reservoir)
    }

    pub fn is_tank(self) -> bool {
        matches!(self, NodeKind::Tank { .. })
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LinkKind {
    Pipe,
    Pump,
    Valve,
}

impl LinkKind {
    /// `true` for links that store no water.
    #[inline]
    pub fn is_zero_length(self) -> bool {
        !matches!(self, LinkKind::Pipe)
    }

    /// Human-readable label, useful for CSV column values.
    pub fn as_str(self) -> &'static str {
        match self {
            LinkKind::Pipe  => "pipe",
            LinkKind::Pump  => "pump",
            LinkKind::Valve => "valve",
        }
    }
}

impl std::fmt::Display for LinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internal volume of a circular pipe, m³.
///
/// `diameter_mm` is converted to metres before squaring:
/// `V = π/4 · L · (d / 1000)²`.
#[inline]
pub fn pipe_volume(length_m: f64, diameter_mm: f64) -> f64 {
    let diameter_m = diameter_mm * 1e-3;
    0.25 * PI * length_m * diameter_m * diameter_m
}

// ── Network ───────────────────────────────────────────────────────────────────

/// Immutable element tables for one pipe network.
///
/// All fields are `pub` for direct indexed access.  Do not construct
/// directly; use [`NetworkBuilder`], which validates link endpoints.
#[derive(Clone, Debug)]
pub struct Network {
    // ── Node data ─────────────────────────────────────────────────────────
    pub node_kind: Vec<NodeKind>,

    // ── Link data (indexed by LinkId) ─────────────────────────────────────
    pub link_kind: Vec<LinkKind>,

    /// Nominal upstream end of each link.
    pub link_from: Vec<NodeId>,

    /// Nominal downstream end of each link.
    pub link_to: Vec<NodeId>,

    /// Physical length in metres (0 for pumps and valves).
    pub link_length_m: Vec<f64>,

    /// Internal diameter in millimetres (0 for pumps and valves).
    pub link_diameter_mm: Vec<f64>,
}

impl Network {
    pub fn node_count(&self) -> usize {
        self.node_kind.len()
    }

    pub fn link_count(&self) -> usize {
        self.link_kind.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_kind.is_empty()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.node_count()).map(|i| NodeId(i as u32))
    }

    pub fn link_ids(&self) -> impl Iterator<Item = LinkId> + '_ {
        (0..self.link_count()).map(|i| LinkId(i as u32))
    }

    /// All reservoir nodes in ascending id order.
    pub fn reservoirs(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.node_ids().filter(|n| self.node_kind[n.index()].is_reservoir())
    }

    /// All pipe links (the only links with storage) in ascending id order.
    pub fn pipes(&self) -> impl Iterator<Item = LinkId> + '_ {
        self.link_ids().filter(|l| self.link_kind[l.index()] == LinkKind::Pipe)
    }

    pub fn node(&self, node: NodeId) -> WqResult<NodeKind> {
        self.node_kind
            .get(node.index())
            .copied()
            .ok_or(WqError::NodeNotFound(node))
    }

    pub fn link(&self, link: LinkId) -> WqResult<LinkKind> {
        self.link_kind
            .get(link.index())
            .copied()
            .ok_or(WqError::LinkNotFound(link))
    }

    /// Nominal `(from, to)` endpoints of `link`.
    pub fn endpoints(&self, link: LinkId) -> WqResult<(NodeId, NodeId)> {
        let i = link.index();
        if i >= self.link_count() {
            return Err(WqError::LinkNotFound(link));
        }
        Ok((self.link_from[i], self.link_to[i]))
    }

    /// Stored volume of `link` in m³ (0 for zero-length links).
    pub fn link_volume(&self, link: LinkId) -> WqResult<f64> {
        let kind = self.link(link)?;
        if kind.is_zero_length() {
            return Ok(0.0);
        }
        let i = link.index();
        Ok(pipe_volume(self.link_length_m[i], self.link_diameter_mm[i]))
    }
}

// ── NetworkBuilder ────────────────────────────────────────────────────────────

/// Construct a [`Network`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use wq_network::NetworkBuilder;
///
/// let mut b = NetworkBuilder::new();
/// let r = b.add_reservoir();
/// let j = b.add_junction();
/// b.add_pipe(r, j, 100.0, 200.0); // 100 m, 200 mm
/// let net = b.build().unwrap();
/// assert_eq!(net.node_count(), 2);
/// assert_eq!(net.link_count(), 1);
/// ```
#[derive(Default)]
pub struct NetworkBuilder {
    nodes: Vec<NodeKind>,
    links: Vec<RawLink>,
}

struct RawLink {
    kind:        LinkKind,
    from:        NodeId,
    to:          NodeId,
    length_m:    f64,
    diameter_mm: f64,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocate for the expected number of nodes and links.
    pub fn with_capacity(nodes: usize, links: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(nodes),
            links: Vec::with_capacity(links),
        }
    }

    fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(kind);
        id
    }

    fn add_link(&mut self, raw: RawLink) -> LinkId {
        let id = LinkId(self.links.len() as u32);
        self.links.push(raw);
        id
    }

    pub fn add_junction(&mut self) -> NodeId {
        self.add_node(NodeKind::Junction)
    }

    pub fn add_reservoir(&mut self) -> NodeId {
        self.add_node(NodeKind::Reservoir)
    }

    pub fn add_tank(&mut self, initial_volume_m3: f64, mixing: TankMixing) -> NodeId {
        self.add_node(NodeKind::Tank { initial_volume_m3, mixing })
    }

    /// Add a pipe from `from` to `to` (nominal flow direction).
    ///
    /// - `length_m`: physical length in metres.
    /// - `diameter_mm`: internal diameter in millimetres.
    pub fn add_pipe(&mut self, from: NodeId, to: NodeId, length_m: f64, diameter_mm: f64) -> LinkId {
        self.add_link(RawLink { kind: LinkKind::Pipe, from, to, length_m, diameter_mm })
    }

    pub fn add_pump(&mut self, from: NodeId, to: NodeId) -> LinkId {
        self.add_link(RawLink { kind: LinkKind::Pump, from, to, length_m: 0.0, diameter_mm: 0.0 })
    }

    pub fn add_valve(&mut self, from: NodeId, to: NodeId) -> LinkId {
        self.add_link(RawLink { kind: LinkKind::Valve, from, to, length_m: 0.0, diameter_mm: 0.0 })
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn link_count(&self) -> usize { self.links.len() }

    /// Consume the builder and produce a [`Network`].
    ///
    /// # Errors
    ///
    /// - [`WqError::NodeNotFound`] if a link references a node that was never
    ///   added.
    /// - [`WqError::Config`] for negative or non-finite pipe dimensions and
    ///   negative tank volumes.
    pub fn build(self) -> WqResult<Network> {
        let node_count = self.nodes.len();

        for (i, kind) in self.nodes.iter().enumerate() {
            if let NodeKind::Tank { initial_volume_m3, .. } = *kind
                && !(initial_volume_m3 >= 0.0 && initial_volume_m3.is_finite())
            {
                return Err(WqError::Config(format!(
                    "tank {} has invalid initial volume {initial_volume_m3}",
                    NodeId(i as u32)
                )));
            }
        }

        for (i, raw) in self.links.iter().enumerate() {
            for end in [raw.from, raw.to] {
                if end.index() >= node_count {
                    return Err(WqError::NodeNotFound(end));
                }
            }
            let dims_ok = [raw.length_m, raw.diameter_mm]
                .iter()
                .all(|v| *v >= 0.0 && v.is_finite());
            if !dims_ok {
                return Err(WqError::Config(format!(
                    "link {} has invalid dimensions (length {} m, diameter {} mm)",
                    LinkId(i as u32),
                    raw.length_m,
                    raw.diameter_mm
                )));
            }
        }

        let links = self.links;
        Ok(Network {
            node_kind:        self.nodes,
            link_kind:        links.iter().map(|l| l.kind).collect(),
            link_from:        links.iter().map(|l| l.from).collect(),
            link_to:          links.iter().map(|l| l.to).collect(),
            link_length_m:    links.iter().map(|l| l.length_m).collect(),
            link_diameter_mm: links.iter().map(|l| l.diameter_mm).collect(),
        })
    }
}
