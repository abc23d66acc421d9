//! Two-source distribution network used by the demo.

use wq_core::NodeId;
use wq_network::{Network, NetworkBuilder, TankMixing};

use crate::TANK_VOLUME_M3;

/// Node handles the demo reports on.
pub struct Nodes {
    pub hard_source: NodeId,
    pub soft_source: NodeId,
    pub blend:       NodeId,
    pub tank:        NodeId,
    pub consumer:    NodeId,
}

/// Build the 7-node network.
///
/// ```text
/// R0 ─pump─▶ J2 ─P2─┐
///                    ├─▶ J4 ─P4─▶ T5 ─P5─▶ J6 (demand)
/// R1 ──P1──▶ J3 ─P3─┘
/// ```
///
/// Node and link ids follow insertion order, which the embedded hydraulic
/// CSV relies on.
pub fn build_network() -> anyhow::Result<(Network, Nodes)> {
    let mut b = NetworkBuilder::new();

    let hard_source = b.add_reservoir();
    let soft_source = b.add_reservoir();
    let j2          = b.add_junction();
    let j3          = b.add_junction();
    let blend       = b.add_junction();
    let tank        = b.add_tank(TANK_VOLUME_M3, TankMixing::Cstr);
    let consumer    = b.add_junction();

    b.add_pump(hard_source, j2);
    b.add_pipe(soft_source, j3,    800.0, 150.0);
    b.add_pipe(j2,          blend, 1_200.0, 200.0);
    b.add_pipe(j3,          blend, 600.0, 150.0);
    b.add_pipe(blend,       tank,  1_500.0, 250.0);
    b.add_pipe(tank,        consumer, 900.0, 250.0);

    let net = b.build()?;
    Ok((net, Nodes { hard_source, soft_source, blend, tank, consumer }))
}
