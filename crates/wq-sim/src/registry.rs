//! The topology registry: one transport or mixing model per network element.

use tracing::debug;
use wq_core::{LinkId, NodeId, WqError, WqResult};
use wq_mixing::NodeModel;
use wq_network::{Network, Orientation};
use wq_transport::LinkModel;

/// Model instances for every node and link, indexed by id.
///
/// Built once from a [`Network`]; the element set never changes afterwards.
/// Links start in their nominal orientation.
#[derive(Clone, Debug)]
pub struct Registry {
    pub nodes: Vec<NodeModel>,
    pub links: Vec<LinkModel>,
}

impl Registry {
    pub fn build(network: &Network) -> WqResult<Self> {
        let nodes: Vec<NodeModel> = network.node_kind.iter().map(|&k| NodeModel::new(k)).collect();

        let links = network
            .link_ids()
            .map(|id| {
                let (from, to) = network.endpoints(id)?;
                Ok(LinkModel::new(
                    network.link(id)?,
                    network.link_volume(id)?,
                    Orientation::new(from, to),
                ))
            })
            .collect::<WqResult<Vec<_>>>()?;

        debug!(nodes = nodes.len(), links = links.len(), "registry built");
        Ok(Self { nodes, links })
    }

    /// # Errors
    ///
    /// [`WqError::NodeNotFound`] if `id` is not in the network.
    pub fn node(&self, id: NodeId) -> WqResult<&NodeModel> {
        self.nodes.get(id.index()).ok_or(WqError::NodeNotFound(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> WqResult<&mut NodeModel> {
        self.nodes.get_mut(id.index()).ok_or(WqError::NodeNotFound(id))
    }

    /// # Errors
    ///
    /// [`WqError::LinkNotFound`] if `id` is not in the network.
    pub fn link(&self, id: LinkId) -> WqResult<&LinkModel> {
        self.links.get(id.index()).ok_or(WqError::LinkNotFound(id))
    }

    pub fn link_mut(&mut self, id: LinkId) -> WqResult<&mut LinkModel> {
        self.links.get_mut(id.index()).ok_or(WqError::LinkNotFound(id))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}
