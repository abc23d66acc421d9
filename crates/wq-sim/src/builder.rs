//! Fluent builder for constructing a [`Simulation`].

use tracing::debug;
use wq_chemistry::ChemistryEngine;
use wq_core::{QualityClock, QualityConfig};
use wq_network::Network;

use crate::{Registry, SimResult, Simulation, Solver};

/// Fluent builder for [`Simulation<E>`].
///
/// # Required inputs
///
/// - [`Network`]: from [`wq_network::NetworkBuilder`]
/// - `E: ChemistryEngine`: the engine that owns solution handles
///
/// # Optional inputs
///
/// | Method        | Default                    |
/// |---------------|----------------------------|
/// | `.config(c)`  | `QualityConfig::default()` |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimulationBuilder::new(network, IdealMixing::new())
///     .config(QualityConfig { timestep_secs: 600.0, ..Default::default() })
///     .build()?;
/// sim.fill_network(&snapshots[0], &inputs, true)?;
/// sim.run(&snapshots, &inputs, &mut NoopObserver)?;
/// ```
pub struct SimulationBuilder<E: ChemistryEngine> {
    network: Network,
    engine:  E,
    config:  Option<QualityConfig>,
}

impl<E: ChemistryEngine> SimulationBuilder<E> {
    pub fn new(network: Network, engine: E) -> Self {
        Self { network, engine, config: None }
    }

    pub fn config(mut self, config: QualityConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Validate the configuration, build one model per element, and return a
    /// simulation ready for [`fill_network`](Simulation::fill_network).
    pub fn build(self) -> SimResult<Simulation<E>> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let registry = Registry::build(&self.network)?;
        let solver = Solver::new(&registry);
        debug!(
            nodes = self.network.node_count(),
            links = self.network.link_count(),
            timestep_secs = config.timestep_secs,
            "simulation built"
        );

        Ok(Simulation {
            config,
            clock: QualityClock::new(),
            network: self.network,
            registry,
            solver,
            engine: self.engine,
        })
    }
}
