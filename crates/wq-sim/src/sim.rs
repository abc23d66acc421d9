//! The `Simulation` struct and its step loop.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info};
use wq_chemistry::ChemistryEngine;
use wq_core::{Composition, InputSolutions, NodeId, QualityClock, QualityConfig, SolutionId};
use wq_network::{HydraulicSnapshot, Network};

use crate::{Quality, Registry, SimError, SimResult, Solver, StepObserver, StepReport};

/// The water quality simulation.
///
/// `Simulation<E>` owns the network, the per-element models, the scheduler
/// and the chemistry engine.  Each [`step`](Self::step):
///
/// 1. **Validate** the timestep, snapshot and reservoir sources.  A failure
///    here leaves every model untouched.
/// 2. **Direction check**: links whose flow sign flipped have their parcels
///    mirrored.
/// 3. **Traverse** from the reservoirs: each node mixes once all upstream
///    links are ready, then pushes its outflow through its downstream links.
/// 4. **Advance** the clock.
///
/// Create via [`SimulationBuilder`][crate::SimulationBuilder].
pub struct Simulation<E: ChemistryEngine> {
    pub config: QualityConfig,

    /// Completed steps and elapsed simulated time.
    pub clock: QualityClock,

    pub network: Network,

    /// Link and node models, indexed by id.
    pub registry: Registry,

    pub solver: Solver,

    /// Owns every solution handle referenced by parcel compositions.
    pub engine: E,
}

impl<E: ChemistryEngine> Simulation<E> {
    // ── Initialization ────────────────────────────────────────────────────

    /// Set the initial contents of every link and node.
    ///
    /// Requires a background entry in `inputs`, and a source entry for every
    /// reservoir when `from_reservoirs` is set.  Returns the number of links
    /// that fell back to the background.
    pub fn fill_network(
        &mut self,
        snapshot:        &HydraulicSnapshot,
        inputs:          &InputSolutions,
        from_reservoirs: bool,
    ) -> SimResult<usize> {
        snapshot.validate(&self.network)?;
        let background = Composition::pure(inputs.background()?);
        let sources = if from_reservoirs { self.resolve_sources(inputs)? } else { FxHashMap::default() };

        Ok(self.solver.fill_network(
            &self.network,
            snapshot,
            &mut self.registry,
            &sources,
            &background,
            from_reservoirs,
        )?)
    }

    /// Apply flow reversals for `snapshot` without moving any water.
    pub fn check_flow_direction(&mut self, snapshot: &HydraulicSnapshot) -> SimResult<usize> {
        snapshot.validate(&self.network)?;
        Ok(self.solver.check_flow_direction(&self.network, snapshot, &mut self.registry)?)
    }

    // ── Stepping ──────────────────────────────────────────────────────────

    /// Advance one quality step of `timestep_secs` using `snapshot`.
    ///
    /// # Errors
    ///
    /// - [`SimError::InvalidTimestep`] if `timestep_secs` is not positive
    ///   and finite.
    /// - [`WqError::Config`](wq_core::WqError::Config) if the snapshot does
    ///   not match the network.
    /// - [`WqError::MissingSource`](wq_core::WqError::MissingSource) if a
    ///   reservoir has no entry in `inputs`.
    pub fn step(
        &mut self,
        snapshot:      &HydraulicSnapshot,
        timestep_secs: f64,
        inputs:        &InputSolutions,
    ) -> SimResult<StepReport> {
        if timestep_secs <= 0.0 || !timestep_secs.is_finite() {
            return Err(SimError::InvalidTimestep(timestep_secs));
        }
        snapshot.validate(&self.network)?;
        let sources = self.resolve_sources(inputs)?;

        let step = self.clock.current_step;
        let reversed = self.solver.check_flow_direction(&self.network, snapshot, &mut self.registry)?;
        let mut report = self.solver.run_step(
            snapshot,
            &mut self.registry,
            &sources,
            timestep_secs,
            self.config.flow_epsilon,
            step,
        )?;
        report.reversed = reversed;

        self.clock.advance(timestep_secs);
        debug!(
            clock = %self.clock,
            mixed = report.mixed_nodes,
            reversed,
            "quality step complete"
        );
        Ok(report)
    }

    /// Step through `snapshots` with `config.timestep_secs`.
    ///
    /// Snapshot `i` drives step `i`, so a run resumed after manual steps
    /// picks up where the clock is.  Stops at `config.end_step()` or when
    /// the snapshots run out, whichever is first.
    pub fn run<O: StepObserver<E>>(
        &mut self,
        snapshots: &[HydraulicSnapshot],
        inputs:    &InputSolutions,
        observer:  &mut O,
    ) -> SimResult<()> {
        loop {
            let now = self.clock.current_step;
            if now >= self.config.end_step() {
                break;
            }
            let Some(snapshot) = snapshots.get(now.0 as usize) else {
                break;
            };

            observer.on_step_start(now);
            let report = self.step(snapshot, self.config.timestep_secs, inputs)?;
            observer.on_step_end(now, &report);

            let done = self.clock.current_step;
            if self.config.is_output_step(done) {
                let clock = self.clock.clone();
                observer.on_snapshot(done, &clock, &mut self.quality());
            }
        }
        observer.on_sim_end(self.clock.current_step);
        Ok(())
    }

    // ── Solution lifecycle ────────────────────────────────────────────────

    /// Release every engine solution no parcel, load or tank references.
    ///
    /// Handles in `protected` are kept as well; pass the sources future
    /// steps will use.  Call between steps only.  Returns the number of
    /// handles released.
    pub fn garbage_collect(&mut self, protected: Option<&InputSolutions>) -> usize {
        let mut live: FxHashSet<SolutionId> = FxHashSet::default();
        for link in &self.registry.links {
            let parcels = link.state.iter().map(|p| &p.composition);
            let loads = link.output_state.iter().map(|l| &l.composition);
            for composition in parcels.chain(loads) {
                live.extend(composition.solutions());
            }
        }
        for node in &self.registry.nodes {
            for composition in node.compositions() {
                live.extend(composition.solutions());
            }
        }
        if let Some(protected) = protected {
            live.extend(protected.solutions());
        }

        let dead: Vec<SolutionId> = self
            .engine
            .solution_ids()
            .into_iter()
            .filter(|id| !live.contains(id))
            .collect();
        if !dead.is_empty() {
            self.engine.remove_solutions(&dead);
            info!(released = dead.len(), live = live.len(), "released unreferenced solutions");
        }
        dead.len()
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn quality(&mut self) -> Quality<'_, E> {
        Quality::new(&self.network, &self.registry, &mut self.engine)
    }

    /// One pure composition per reservoir.
    fn resolve_sources(&self, inputs: &InputSolutions) -> SimResult<FxHashMap<NodeId, Composition>> {
        let mut sources = FxHashMap::default();
        for node in self.network.reservoirs() {
            sources.insert(node, Composition::pure(inputs.source(node)?));
        }
        Ok(sources)
    }
}
