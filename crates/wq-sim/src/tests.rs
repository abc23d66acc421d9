//! Unit tests for wq-sim.
//!
//! Networks are hand-built; every pipe holds exactly 10 m³ so step volumes
//! map to round parcel positions.

use wq_chemistry::{IdealMixing, SolutionRecord};
use wq_core::{InputSolutions, LinkId, NodeId, QualityConfig, SolutionId};
use wq_network::{HydraulicSnapshot, Network, NetworkBuilder, pipe_volume};

use crate::{Simulation, SimulationBuilder};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Length (m) of a 1000 mm pipe holding 10 m³.
fn ten_m3() -> f64 {
    10.0 / pipe_volume(1.0, 1000.0)
}

struct Solutions {
    /// Background: no calcium.
    x: SolutionId,
    /// 2 mmol/L calcium.
    a: SolutionId,
    /// 1 mmol/L sodium.
    b: SolutionId,
}

fn engine() -> (IdealMixing, Solutions) {
    let mut engine = IdealMixing::new();
    let x = engine.add_solution(SolutionRecord::new(7.0, 100.0, 15.0));
    let a = engine.add_solution(SolutionRecord::new(7.0, 500.0, 15.0).with_total("Ca", 2.0));
    let b = engine.add_solution(SolutionRecord::new(8.0, 300.0, 15.0).with_total("Na", 1.0));
    (engine, Solutions { x, a, b })
}

fn snapshot(network: &Network, flows: &[f64]) -> HydraulicSnapshot {
    let mut s = HydraulicSnapshot::new(network);
    for (i, &q) in flows.iter().enumerate() {
        s.set_flow(LinkId(i as u32), q).unwrap();
    }
    s
}

fn build(network: Network) -> (Simulation<IdealMixing>, Solutions) {
    let (engine, sol) = engine();
    let config = QualityConfig { timestep_secs: 1.0, ..QualityConfig::default() };
    (SimulationBuilder::new(network, engine).config(config).build().unwrap(), sol)
}

/// ```text
///   R0 ──P0──▶ J1 ──P1──▶ J2
/// ```
fn linear_chain() -> Network {
    let mut b = NetworkBuilder::new();
    let r = b.add_reservoir();
    let j1 = b.add_junction();
    let j2 = b.add_junction();
    b.add_pipe(r, j1, ten_m3(), 1000.0);
    b.add_pipe(j1, j2, ten_m3(), 1000.0);
    b.build().unwrap()
}

/// ```text
///   R0 ──P0──▶ J2 ──P2──▶ J3
///   R1 ──P1──▶ J2
/// ```
fn two_sources() -> Network {
    let mut b = NetworkBuilder::new();
    let r0 = b.add_reservoir();
    let r1 = b.add_reservoir();
    let j2 = b.add_junction();
    let j3 = b.add_junction();
    b.add_pipe(r0, j2, ten_m3(), 1000.0);
    b.add_pipe(r1, j2, ten_m3(), 1000.0);
    b.add_pipe(j2, j3, ten_m3(), 1000.0);
    b.build().unwrap()
}

fn inputs(sol: &Solutions, sources: &[(u32, SolutionId)]) -> InputSolutions {
    sources
        .iter()
        .fold(InputSolutions::new().with_background(sol.x), |acc, &(n, s)| acc.with_source(NodeId(n), s))
}

// ── Registry ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod registry {
    use approx::assert_relative_eq;
    use wq_core::WqError;
    use wq_network::Orientation;

    use super::*;
    use crate::Registry;

    #[test]
    fn one_model_per_element() {
        let mut b = NetworkBuilder::new();
        let r = b.add_reservoir();
        let j = b.add_junction();
        b.add_pipe(r, j, ten_m3(), 1000.0);
        b.add_valve(j, r);
        let registry = Registry::build(&b.build().unwrap()).unwrap();

        assert_eq!(registry.node_count(), 2);
        assert_eq!(registry.link_count(), 2);
        assert!(registry.node(r).unwrap().is_reservoir());
        assert_relative_eq!(registry.link(LinkId(0)).unwrap().volume, 10.0, epsilon = 1e-9);
        assert_eq!(registry.link(LinkId(1)).unwrap().volume, 0.0);
        assert_eq!(registry.link(LinkId(1)).unwrap().orientation, Orientation::new(j, r));
    }

    #[test]
    fn unknown_ids_are_errors() {
        let mut registry = Registry::build(&linear_chain()).unwrap();
        assert!(matches!(registry.node(NodeId(9)), Err(WqError::NodeNotFound(NodeId(9)))));
        assert!(matches!(registry.link_mut(LinkId(9)), Err(WqError::LinkNotFound(LinkId(9)))));
    }
}

// ── Fill ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod fill {
    use wq_core::{Composition, WqError};

    use super::*;
    use crate::SimError;

    #[test]
    fn fill_from_reservoir_reaches_whole_chain() {
        let (mut sim, sol) = build(linear_chain());
        let snap = snapshot(&sim.network, &[2.0, 2.0]);
        let fallback = sim.fill_network(&snap, &inputs(&sol, &[(0, sol.a)]), true).unwrap();

        assert_eq!(fallback, 0);
        for link in &sim.registry.links {
            assert_eq!(link.state.len(), 1);
            assert_eq!(link.state[0].composition, Composition::pure(sol.a));
            assert!(!link.ready);
        }
        let q = sim.quality();
        assert_eq!(q.mixture_node(NodeId(2)).unwrap(), Composition::pure(sol.a));
    }

    #[test]
    fn fill_with_background_only() {
        let (mut sim, sol) = build(linear_chain());
        let snap = snapshot(&sim.network, &[2.0, 2.0]);
        // No reservoir source is needed when filling from the background.
        sim.fill_network(&snap, &InputSolutions::new().with_background(sol.x), false).unwrap();
        assert!(sim.registry.links.iter().all(|l| l.state[0].composition == Composition::pure(sol.x)));
    }

    #[test]
    fn fill_weights_inflow_by_flow() {
        let (mut sim, sol) = build(two_sources());
        let snap = snapshot(&sim.network, &[1.0, 3.0, 4.0]);
        sim.fill_network(&snap, &inputs(&sol, &[(0, sol.a), (1, sol.b)]), true).unwrap();

        let expected: Composition = [(sol.a, 0.25), (sol.b, 0.75)].into_iter().collect();
        assert!(sim.registry.links[2].state[0].composition.approx_eq(&expected, 1e-12));
    }

    #[test]
    fn unreached_links_fall_back_to_background() {
        let mut b = NetworkBuilder::new();
        let j0 = b.add_junction();
        let j1 = b.add_junction();
        b.add_pipe(j0, j1, ten_m3(), 1000.0);
        let (mut sim, sol) = build(b.build().unwrap());

        let snap = snapshot(&sim.network, &[1.0]);
        let fallback = sim.fill_network(&snap, &inputs(&sol, &[]), true).unwrap();
        assert_eq!(fallback, 1);
        assert_eq!(sim.registry.links[0].state[0].composition, Composition::pure(sol.x));
    }

    #[test]
    fn fill_terminates_on_loops() {
        // R0 → J1 → J2 → J1
        let mut b = NetworkBuilder::new();
        let r = b.add_reservoir();
        let j1 = b.add_junction();
        let j2 = b.add_junction();
        b.add_pipe(r, j1, ten_m3(), 1000.0);
        b.add_pipe(j1, j2, ten_m3(), 1000.0);
        b.add_pipe(j2, j1, ten_m3(), 1000.0);
        let (mut sim, sol) = build(b.build().unwrap());

        let snap = snapshot(&sim.network, &[1.0, 1.0, 1.0]);
        let fallback = sim.fill_network(&snap, &inputs(&sol, &[(0, sol.a)]), true).unwrap();
        assert_eq!(fallback, 0);
        assert!(sim.registry.links.iter().all(|l| l.state[0].composition == Composition::pure(sol.a)));
    }

    #[test]
    fn missing_background_is_rejected() {
        let (mut sim, sol) = build(linear_chain());
        let snap = snapshot(&sim.network, &[1.0, 1.0]);
        let bad = InputSolutions::new().with_source(NodeId(0), sol.a);
        assert!(matches!(
            sim.fill_network(&snap, &bad, true),
            Err(SimError::Core(WqError::MissingBackground))
        ));
        assert!(sim.registry.links.iter().all(|l| l.state.is_empty()));
    }

    #[test]
    fn missing_source_is_rejected_before_fill() {
        let (mut sim, sol) = build(linear_chain());
        let snap = snapshot(&sim.network, &[1.0, 1.0]);
        assert!(matches!(
            sim.fill_network(&snap, &inputs(&sol, &[]), true),
            Err(SimError::Core(WqError::MissingSource(NodeId(0))))
        ));
        assert!(sim.registry.links.iter().all(|l| l.state.is_empty()));
    }
}

// ── Stepping ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod stepping {
    use approx::assert_relative_eq;
    use wq_core::{Composition, Step, WqError};

    use super::*;
    use crate::SimError;

    #[test]
    fn linear_chain_step() {
        let (mut sim, sol) = build(linear_chain());
        let inp = inputs(&sol, &[(0, sol.a)]);
        let snap = snapshot(&sim.network, &[2.0, 2.0]);
        sim.fill_network(&snap, &inp, true).unwrap();

        let report = sim.step(&snap, 1.0, &inp).unwrap();
        assert_eq!(report.step, Step(0));
        assert_eq!(report.mixed_nodes, 3);
        assert!(report.unreached_links.is_empty());
        assert_eq!(sim.clock.current_step, Step(1));

        let p0 = &sim.registry.links[0];
        assert_eq!(p0.state.len(), 2);
        assert_relative_eq!(p0.state[0].x0, 0.0);
        assert_relative_eq!(p0.state[0].x1, 0.2, epsilon = 1e-9);
        assert_relative_eq!(p0.state[1].x1, 1.0);
        assert!(p0.state.iter().all(|p| p.composition == Composition::pure(sol.a)));
        assert_relative_eq!(p0.exited_volume(), 2.0, epsilon = 1e-9);
        assert!(sim.registry.links.iter().all(|l| !l.ready));

        let expected = 2.0 * 40.078;
        let mut q = sim.quality();
        assert_relative_eq!(q.conc_node(NodeId(1), "Ca", "mg").unwrap(), expected, epsilon = 1e-9);
    }

    #[test]
    fn two_source_mixing() {
        let (mut sim, sol) = build(two_sources());
        let inp = inputs(&sol, &[(0, sol.a), (1, sol.b)]);
        let snap = snapshot(&sim.network, &[1.0, 1.0, 2.0]);
        sim.fill_network(&snap, &inp, true).unwrap();
        sim.step(&snap, 1.0, &inp).unwrap();

        let j = &sim.registry.nodes[2];
        assert_eq!(j.mixed_parcels.len(), 1);
        assert_relative_eq!(j.mixed_parcels[0].volume, 2.0, epsilon = 1e-9);
        assert_relative_eq!(j.mixed_parcels[0].composition.get(sol.a), 0.5, epsilon = 1e-9);
        assert_relative_eq!(j.mixed_parcels[0].composition.get(sol.b), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn node_waits_for_every_upstream_branch() {
        // The A branch is two pipes long and is traversed first; J3 must not
        // mix until the B branch has delivered too.
        //
        //   R0 ──P0──▶ J1 ──P1──▶ J3
        //   R2 ──P2──────────────▶ J3
        let mut b = NetworkBuilder::new();
        let r0 = b.add_reservoir();
        let j1 = b.add_junction();
        let r2 = b.add_reservoir();
        let j3 = b.add_junction();
        b.add_pipe(r0, j1, ten_m3(), 1000.0);
        b.add_pipe(j1, j3, ten_m3(), 1000.0);
        b.add_pipe(r2, j3, ten_m3(), 1000.0);
        let (mut sim, sol) = build(b.build().unwrap());

        let inp = inputs(&sol, &[(0, sol.a), (2, sol.b)]);
        let snap = snapshot(&sim.network, &[1.0, 1.0, 1.0]);
        sim.fill_network(&snap, &inp, true).unwrap();
        let report = sim.step(&snap, 1.0, &inp).unwrap();

        assert_eq!(report.mixed_nodes, 4);
        let mixed = &sim.registry.nodes[j3.index()].mixed_parcels;
        assert_eq!(mixed.len(), 1);
        assert_relative_eq!(mixed[0].volume, 2.0, epsilon = 1e-9);
        assert_relative_eq!(mixed[0].composition.get(sol.b), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn reversal_mirrors_parcels() {
        let mut b = NetworkBuilder::new();
        let r0 = b.add_reservoir();
        let r1 = b.add_reservoir();
        b.add_pipe(r0, r1, ten_m3(), 1000.0);
        let (mut sim, sol) = build(b.build().unwrap());
        let inp = inputs(&sol, &[(0, sol.a), (1, sol.b)]);

        let forward = snapshot(&sim.network, &[2.0]);
        sim.fill_network(&forward, &inp, false).unwrap();
        assert_eq!(sim.step(&forward, 1.0, &inp).unwrap().reversed, 0);

        let backward = snapshot(&sim.network, &[-2.0]);
        let report = sim.step(&backward, 1.0, &inp).unwrap();
        assert_eq!(report.reversed, 1);
        assert_eq!(sim.solver.downstream_links(r1), &[LinkId(0)]);
        assert!(sim.solver.downstream_links(r0).is_empty());

        // The A slug sat at the old inlet, which is now the outlet.
        let p = &sim.registry.links[0];
        assert_eq!(p.output_state.len(), 1);
        assert_eq!(p.output_state[0].composition, Composition::pure(sol.a));
        assert_relative_eq!(p.output_state[0].volume, 2.0, epsilon = 1e-9);
        assert_eq!(p.state.len(), 2);
        assert_eq!(p.state[0].composition, Composition::pure(sol.b));
        assert_eq!(p.state[1].composition, Composition::pure(sol.x));
        assert!(p.is_partition(1e-9));
    }

    #[test]
    fn zero_flow_leaves_state_alone() {
        let (mut sim, sol) = build(linear_chain());
        let inp = inputs(&sol, &[(0, sol.a)]);
        let snap = snapshot(&sim.network, &[0.0, 0.0]);
        sim.fill_network(&snap, &inp, false).unwrap();
        let before: Vec<_> = sim.registry.links.iter().map(|l| l.state.clone()).collect();

        let report = sim.step(&snap, 60.0, &inp).unwrap();
        assert!(report.unreached_links.is_empty());
        for (link, state) in sim.registry.links.iter().zip(before) {
            assert_eq!(link.state, state);
            assert!(link.output_state.is_empty());
        }
    }

    #[test]
    fn cyclic_orientation_is_reported() {
        // R0 → J1 → J2 → J1: J1 waits on P2, which waits on J1.
        let mut b = NetworkBuilder::new();
        let r = b.add_reservoir();
        let j1 = b.add_junction();
        let j2 = b.add_junction();
        b.add_pipe(r, j1, ten_m3(), 1000.0);
        b.add_pipe(j1, j2, ten_m3(), 1000.0);
        b.add_pipe(j2, j1, ten_m3(), 1000.0);
        let (mut sim, sol) = build(b.build().unwrap());
        let inp = inputs(&sol, &[(0, sol.a)]);
        let snap = snapshot(&sim.network, &[1.0, 1.0, 1.0]);
        sim.fill_network(&snap, &inp, false).unwrap();

        let report = sim.step(&snap, 1.0, &inp).unwrap();
        assert_eq!(report.unreached_links, vec![LinkId(1), LinkId(2)]);
        assert_eq!(report.mixed_nodes, 1);
        assert!(sim.registry.links.iter().all(|l| !l.ready));
    }

    #[test]
    fn invalid_timestep_is_rejected() {
        let (mut sim, sol) = build(linear_chain());
        let inp = inputs(&sol, &[(0, sol.a)]);
        let snap = snapshot(&sim.network, &[1.0, 1.0]);
        for dt in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(sim.step(&snap, dt, &inp), Err(SimError::InvalidTimestep(_))));
        }
        assert_eq!(sim.clock.current_step, Step::ZERO);
    }

    #[test]
    fn missing_source_leaves_simulation_usable() {
        let (mut sim, sol) = build(linear_chain());
        let good = inputs(&sol, &[(0, sol.a)]);
        let snap = snapshot(&sim.network, &[2.0, 2.0]);
        sim.fill_network(&snap, &good, false).unwrap();
        let before: Vec<_> = sim.registry.links.iter().map(|l| l.state.clone()).collect();

        let bad = inputs(&sol, &[]);
        assert!(matches!(
            sim.step(&snap, 1.0, &bad),
            Err(SimError::Core(WqError::MissingSource(NodeId(0))))
        ));
        let after: Vec<_> = sim.registry.links.iter().map(|l| l.state.clone()).collect();
        assert_eq!(before, after);
        assert_eq!(sim.clock.current_step, Step::ZERO);

        sim.step(&snap, 1.0, &good).unwrap();
        assert_eq!(sim.clock.current_step, Step(1));
    }

    #[test]
    fn mismatched_snapshot_is_rejected() {
        let (mut sim, sol) = build(linear_chain());
        let wrong = HydraulicSnapshot::new(&two_sources());
        assert!(matches!(
            sim.step(&wrong, 1.0, &inputs(&sol, &[(0, sol.a)])),
            Err(SimError::Core(WqError::Config(_)))
        ));
    }
}

// ── Queries ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod queries {
    use approx::assert_relative_eq;
    use wq_chemistry::ChemError;
    use wq_core::{Composition, WqError};

    use super::*;
    use crate::SimError;

    /// Linear chain filled with background, then one 2 m³ step of A.
    fn stepped() -> (Simulation<IdealMixing>, Solutions) {
        let (mut sim, sol) = build(linear_chain());
        let inp = inputs(&sol, &[(0, sol.a)]);
        let snap = snapshot(&sim.network, &[2.0, 2.0]);
        sim.fill_network(&snap, &inp, false).unwrap();
        sim.step(&snap, 1.0, &inp).unwrap();
        (sim, sol)
    }

    #[test]
    fn link_queries() {
        let (mut sim, _) = stepped();
        let mut q = sim.quality();
        let p0 = LinkId(0);

        assert_relative_eq!(q.conc_link(p0, "Ca", "mmol").unwrap(), 2.0);
        assert_relative_eq!(q.conc_link_avg(p0, "Ca", "mmol").unwrap(), 0.4, epsilon = 1e-9);

        let profile = q.conc_link_profile(p0, "Ca", "mmol").unwrap();
        assert_eq!(profile.len(), 2);
        assert_relative_eq!(profile[0].conc, 2.0);
        assert_relative_eq!(profile[1].conc, 0.0);
        assert_relative_eq!(profile[1].x0, 0.2, epsilon = 1e-9);
        assert_eq!(q.parcels(p0).unwrap().len(), 2);
    }

    #[test]
    fn node_queries_see_background_leaving_the_pipe() {
        let (mut sim, sol) = stepped();
        let mut q = sim.quality();
        assert_eq!(q.conc_node(NodeId(1), "Ca", "mmol").unwrap(), 0.0);
        assert_eq!(q.mixture_node(NodeId(1)).unwrap(), Composition::pure(sol.x));
        assert_eq!(q.mixture_node_avg(NodeId(1)).unwrap(), Composition::pure(sol.x));
        assert_relative_eq!(q.properties_node(NodeId(1)).unwrap().conductivity, 100.0);
        assert_relative_eq!(q.properties_node_avg(NodeId(0)).unwrap().conductivity, 500.0);
        assert_relative_eq!(q.conc_node_avg(NodeId(0), "Ca", "mmol").unwrap(), 2.0);
    }

    #[test]
    fn empty_node_reads_zero() {
        let (mut sim, _) = build(linear_chain());
        let mut q = sim.quality();
        assert_eq!(q.conc_node(NodeId(2), "Ca", "mg").unwrap(), 0.0);
        assert_eq!(q.conc_node_avg(NodeId(2), "Ca", "mg").unwrap(), 0.0);
        assert!(q.mixture_node_avg(NodeId(2)).unwrap().is_empty());
        assert_eq!(q.conc_link_avg(LinkId(0), "Ca", "mg").unwrap(), 0.0);
        assert!(q.conc_link_profile(LinkId(1), "Ca", "mg").unwrap().is_empty());
    }

    #[test]
    fn bad_arguments_are_errors() {
        let (mut sim, _) = stepped();
        let mut q = sim.quality();
        assert!(matches!(
            q.conc_node(NodeId(7), "Ca", "mg"),
            Err(SimError::Core(WqError::NodeNotFound(_)))
        ));
        assert!(matches!(
            q.conc_link(LinkId(0), "Ca", "mg/L"),
            Err(SimError::Chemistry(ChemError::UnsupportedUnits(_)))
        ));
    }
}

// ── Garbage collection ────────────────────────────────────────────────────────

#[cfg(test)]
mod gc {
    use wq_chemistry::ChemistryEngine;
    use wq_core::Composition;

    use super::*;

    #[test]
    fn releases_only_unreferenced_solutions() {
        let (mut sim, sol) = build(two_sources());
        let inp = inputs(&sol, &[(0, sol.a), (1, sol.b)]);
        let snap = snapshot(&sim.network, &[1.0, 1.0, 2.0]);
        sim.fill_network(&snap, &inp, true).unwrap();
        sim.step(&snap, 1.0, &inp).unwrap();

        let blend: Composition = [(sol.a, 0.5), (sol.b, 0.5)].into_iter().collect();
        let mixed = sim.engine.mix(&blend).unwrap();

        assert_eq!(sim.garbage_collect(Some(&inp)), 1);
        assert!(sim.engine.get(mixed).is_none());
        for id in [sol.x, sol.a, sol.b] {
            assert!(sim.engine.get(id).is_some());
        }

        // Without protection the unused background goes too.
        assert_eq!(sim.garbage_collect(None), 1);
        assert!(sim.engine.get(sol.x).is_none());
        assert!(sim.engine.get(sol.a).is_some());
        assert_eq!(sim.garbage_collect(None), 0);
    }
}

// ── Batch run ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod run {
    use wq_core::{QualityClock, Step};

    use super::*;
    use crate::{NoopObserver, Quality, StepObserver, StepReport};

    #[derive(Default)]
    struct Recorder {
        starts:    Vec<Step>,
        ends:      Vec<Step>,
        snapshots: Vec<(Step, f64)>,
        final_step: Option<Step>,
    }

    impl StepObserver<IdealMixing> for Recorder {
        fn on_step_start(&mut self, step: Step) {
            self.starts.push(step);
        }

        fn on_step_end(&mut self, step: Step, _report: &StepReport) {
            self.ends.push(step);
        }

        fn on_snapshot(&mut self, step: Step, _clock: &QualityClock, q: &mut Quality<'_, IdealMixing>) {
            let ca = q.conc_node(NodeId(1), "Ca", "mmol").unwrap();
            self.snapshots.push((step, ca));
        }

        fn on_sim_end(&mut self, final_step: Step) {
            self.final_step = Some(final_step);
        }
    }

    #[test]
    fn run_drives_observer_hooks() {
        let (mut sim, sol) = build(linear_chain());
        sim.config.total_steps = 3;
        sim.config.output_interval_steps = 2;
        let inp = inputs(&sol, &[(0, sol.a)]);
        let snaps = vec![snapshot(&sim.network, &[2.0, 2.0]); 5];
        sim.fill_network(&snaps[0], &inp, true).unwrap();

        let mut rec = Recorder::default();
        sim.run(&snaps, &inp, &mut rec).unwrap();

        assert_eq!(rec.starts, vec![Step(0), Step(1), Step(2)]);
        assert_eq!(rec.ends, rec.starts);
        assert_eq!(rec.snapshots, vec![(Step(2), 2.0)]);
        assert_eq!(rec.final_step, Some(Step(3)));
        assert_eq!(sim.clock.elapsed_secs, 3.0);
    }

    #[test]
    fn run_stops_when_snapshots_run_out() {
        let (mut sim, sol) = build(linear_chain());
        let inp = inputs(&sol, &[(0, sol.a)]);
        let snaps = vec![snapshot(&sim.network, &[1.0, 1.0]); 2];
        sim.fill_network(&snaps[0], &inp, true).unwrap();
        sim.run(&snaps, &inp, &mut NoopObserver).unwrap();
        assert_eq!(sim.clock.current_step, Step(2));
    }
}
