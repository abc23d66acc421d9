//! The step scheduler: flow-direction check, readiness-gated traversal, and
//! the one-off network fill.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, warn};
use wq_core::{Composition, LinkId, NodeId, Step, VOLUME_EPSILON, WqResult};
use wq_mixing::MixInput;
use wq_network::{HydraulicSnapshot, Network};

use crate::Registry;

/// Summary of one completed quality step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepReport {
    /// Index of the step that ran (the clock value before it advanced).
    pub step: Step,
    /// Links whose parcels were mirrored for a flow reversal.
    pub reversed: usize,
    /// Nodes that mixed.
    pub mixed_nodes: usize,
    /// Links never reached by the traversal.  Non-empty only when the flow
    /// orientation contains a cycle; these links keep their previous state.
    pub unreached_links: Vec<LinkId>,
}

/// Per-step scheduling state.
///
/// `upstream[n]` / `downstream[n]` list the links entering / leaving node `n`
/// under the current flow orientation, in ascending [`LinkId`] order.  They
/// are rebuilt whenever a link reverses.
#[derive(Clone, Debug, Default)]
pub struct Solver {
    pub upstream:   Vec<Vec<LinkId>>,
    pub downstream: Vec<Vec<LinkId>>,
    /// Nodes that have mixed during the current step.
    mixed: FxHashSet<NodeId>,
}

impl Solver {
    pub fn new(registry: &Registry) -> Self {
        let mut solver = Self::default();
        solver.rebuild_adjacency(registry);
        solver
    }

    pub fn rebuild_adjacency(&mut self, registry: &Registry) {
        let n = registry.node_count();
        self.upstream = vec![Vec::new(); n];
        self.downstream = vec![Vec::new(); n];
        for (i, link) in registry.links.iter().enumerate() {
            let id = LinkId(i as u32);
            self.downstream[link.upstream().index()].push(id);
            self.upstream[link.downstream().index()].push(id);
        }
    }

    pub fn upstream_links(&self, node: NodeId) -> &[LinkId] {
        self.upstream.get(node.index()).map_or(&[][..], Vec::as_slice)
    }

    pub fn downstream_links(&self, node: NodeId) -> &[LinkId] {
        self.downstream.get(node.index()).map_or(&[][..], Vec::as_slice)
    }

    /// Mirror every link whose flow sign flipped since its last recorded
    /// orientation.  Returns the number of links reversed.
    pub fn check_flow_direction(
        &mut self,
        network:  &Network,
        snapshot: &HydraulicSnapshot,
        registry: &mut Registry,
    ) -> WqResult<usize> {
        let mut reversed = 0;
        for id in network.link_ids() {
            let link = registry.link_mut(id)?;
            let orientation = snapshot.orientation(network, id, link.orientation)?;
            if orientation != link.orientation {
                link.reverse_parcels(orientation);
                reversed += 1;
            }
        }
        if reversed > 0 {
            self.rebuild_adjacency(registry);
            info!(reversed, "flow reversal");
        }
        Ok(reversed)
    }

    pub fn reset_ready_state(registry: &mut Registry) {
        for link in &mut registry.links {
            link.ready = false;
        }
    }

    /// Entry points of a traversal: every reservoir plus every node without
    /// upstream links, ordered so they pop in ascending id.
    fn entry_stack(&self, registry: &Registry) -> Vec<NodeId> {
        let mut stack: Vec<NodeId> = (0..registry.node_count())
            .filter(|&i| registry.nodes[i].is_reservoir() || self.upstream[i].is_empty())
            .map(|i| NodeId(i as u32))
            .collect();
        stack.reverse();
        stack
    }

    /// Move water through the network for one step.
    ///
    /// The caller must have run [`check_flow_direction`](Self::check_flow_direction)
    /// against `snapshot`.  `sources` holds the composition each reservoir
    /// injects; every reservoir must have an entry.
    ///
    /// A node mixes once, after every upstream link is ready.  It then
    /// pushes its outflow share through each downstream link and schedules
    /// the node at the far end.  Links with flow at or below `flow_epsilon`
    /// still run `push_pull` with zero volume so they never block the
    /// barrier.
    pub fn run_step(
        &mut self,
        snapshot:      &HydraulicSnapshot,
        registry:      &mut Registry,
        sources:       &FxHashMap<NodeId, Composition>,
        timestep_secs: f64,
        flow_epsilon:  f64,
        step:          Step,
    ) -> WqResult<StepReport> {
        Self::reset_ready_state(registry);
        self.mixed.clear();

        let mut stack = self.entry_stack(registry);
        let Solver { upstream, downstream, mixed } = &mut *self;
        let Registry { nodes, links } = &mut *registry;

        while let Some(node) = stack.pop() {
            let idx = node.index();
            if mixed.contains(&node) {
                continue;
            }
            let is_reservoir = nodes[idx].is_reservoir();
            if !is_reservoir && !upstream[idx].iter().all(|l| links[l.index()].ready) {
                continue;
            }

            let inflow: Vec<_> = if is_reservoir {
                Vec::new()
            } else {
                upstream[idx]
                    .iter()
                    .flat_map(|l| links[l.index()].output_state.iter().cloned())
                    .collect()
            };
            let outflows: Vec<f64> = downstream[idx]
                .iter()
                .map(|&l| {
                    let q = snapshot.flow(l).abs();
                    if q <= flow_epsilon { 0.0 } else { q }
                })
                .collect();

            nodes[idx].mix(&MixInput {
                node,
                inflow: &inflow,
                demand: snapshot.demand(node),
                timestep_secs,
                outflows: &outflows,
                source: sources.get(&node),
                tank_volume: snapshot.tank_volume(node),
            })?;
            mixed.insert(node);

            let outflow = &nodes[idx].outflow;
            for (i, &l) in downstream[idx].iter().enumerate() {
                let incoming = outflow.get(i).map_or(&[][..], Vec::as_slice);
                links[l.index()].push_pull(outflows[i] * timestep_secs, incoming);
            }
            for &l in downstream[idx].iter().rev() {
                stack.push(links[l.index()].downstream());
            }
        }

        let unreached_links: Vec<LinkId> = links
            .iter()
            .enumerate()
            .filter(|(_, l)| !l.ready)
            .map(|(i, _)| LinkId(i as u32))
            .collect();
        if !unreached_links.is_empty() {
            warn!(
                %step,
                count = unreached_links.len(),
                "links not reached; flow orientation contains a cycle"
            );
        }

        let report = StepReport {
            step,
            reversed: 0,
            mixed_nodes: mixed.len(),
            unreached_links,
        };
        Self::reset_ready_state(registry);
        Ok(report)
    }

    /// Propagate source compositions through the network without time.
    ///
    /// With `from_reservoirs == false` every link and node gets `background`.
    /// Otherwise each node takes the |flow|-weighted blend of its filled
    /// upstream links (reservoirs take their source) and fills its
    /// downstream links in turn.  When no node is eligible, the lowest-id
    /// node with at least one filled upstream link is released, so loops
    /// terminate.  Links no source reaches get `background`.
    ///
    /// Returns the number of links filled with `background` as a fallback.
    pub fn fill_network(
        &mut self,
        network:         &Network,
        snapshot:        &HydraulicSnapshot,
        registry:        &mut Registry,
        sources:         &FxHashMap<NodeId, Composition>,
        background:      &Composition,
        from_reservoirs: bool,
    ) -> WqResult<usize> {
        self.check_flow_direction(network, snapshot, registry)?;

        if !from_reservoirs {
            for link in &mut registry.links {
                link.fill(background);
            }
            for node in &mut registry.nodes {
                node.fill(background);
            }
            Self::reset_ready_state(registry);
            info!(links = registry.link_count(), "network filled with background");
            return Ok(0);
        }

        let mut filled: FxHashMap<LinkId, Composition> = FxHashMap::default();
        let mut done: FxHashSet<NodeId> = FxHashSet::default();
        let mut stack: Vec<NodeId> = network.reservoirs().collect();
        stack.reverse();
        let mut released: Option<NodeId> = None;

        loop {
            while let Some(node) = stack.pop() {
                if done.contains(&node) {
                    continue;
                }
                let ups = self.upstream_links(node);
                let composition = match sources.get(&node) {
                    Some(source) => source.clone(),
                    None => {
                        let complete = ups.iter().all(|l| filled.contains_key(l));
                        if !complete && released != Some(node) {
                            continue;
                        }
                        let inputs: Vec<(&Composition, f64)> = ups
                            .iter()
                            .filter_map(|l| filled.get(l).map(|c| (c, snapshot.flow(*l).abs())))
                            .collect();
                        blend(&inputs)
                    }
                };

                done.insert(node);
                registry.node_mut(node)?.fill(&composition);

                let mut next = Vec::new();
                for &l in self.downstream_links(node) {
                    if filled.contains_key(&l) {
                        continue;
                    }
                    let link = registry.link_mut(l)?;
                    link.fill(&composition);
                    let to = link.downstream();
                    filled.insert(l, composition.clone());
                    if !registry.node(to)?.is_reservoir() {
                        next.push(to);
                    }
                }
                stack.extend(next.into_iter().rev());
            }

            let pending = network.node_ids().find(|n| {
                !done.contains(n) && self.upstream_links(*n).iter().any(|l| filled.contains_key(l))
            });
            match pending {
                Some(node) => {
                    debug!(%node, "releasing node with partially filled inflow");
                    released = Some(node);
                    stack.push(node);
                }
                None => break,
            }
        }

        let mut fallback = 0;
        for (i, link) in registry.links.iter_mut().enumerate() {
            if !filled.contains_key(&LinkId(i as u32)) {
                link.fill(background);
                fallback += 1;
            }
        }
        for (i, node) in registry.nodes.iter_mut().enumerate() {
            if !done.contains(&NodeId(i as u32)) {
                node.fill(background);
            }
        }
        if fallback > 0 {
            warn!(fallback, "links not reached from any reservoir, filled with background");
        }

        Self::reset_ready_state(registry);
        info!(filled = filled.len(), fallback, "network filled from reservoirs");
        Ok(fallback)
    }
}

/// Blend `(composition, weight)` pairs.  Falls back to equal weights when
/// every weight is near zero.
fn blend(inputs: &[(&Composition, f64)]) -> Composition {
    let total: f64 = inputs.iter().map(|(_, w)| w).sum();
    let equal = total <= VOLUME_EPSILON;
    let mut acc = Composition::new();
    for &(c, w) in inputs {
        acc.add_weighted(c, if equal { 1.0 } else { w });
    }
    acc.normalized()
}
