//! chain: smallest end-to-end run of the water quality engine.
//!
//! Two reservoirs of different hardness feed a blending junction, a
//! completely mixed tank and a single consumer.  The hydraulics cycle
//! through four hourly periods loaded from an embedded CSV; calcium is
//! segmented along every pipe and written to `output/chain/`.

mod network;

use std::io::Cursor;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use wq_chemistry::{IdealMixing, SolutionRecord};
use wq_core::{InputSolutions, QualityConfig, Step};
use wq_network::{HydraulicSnapshot, load_snapshots_reader};
use wq_output::{CsvWriter, PipeSegmentation, SegmentObserver};
use wq_sim::{SimulationBuilder, StepObserver, StepReport};

use network::build_network;

// ── Constants ─────────────────────────────────────────────────────────────────

const TIMESTEP_SECS:         f64 = 300.0; // 5-minute quality step
const STEPS_PER_PERIOD:      u64 = 12;    // one hydraulic period = 1 hour
const SIM_HOURS:             u64 = 8;
const OUTPUT_INTERVAL_STEPS: u64 = 6;
const SEGMENT_LENGTH_M:      f64 = 100.0;
const TANK_VOLUME_M3:        f64 = 200.0;
const ELEMENT:               &str = "Ca";
const UNITS:                 &str = "mg";

/// Four hydraulic periods; ids follow `network::build_network`.
///
/// Period 1 runs on the hard source alone, period 3 on the soft source alone.
const HYDRAULICS_CSV: &str = "\
step,kind,id,value
0,flow,0,0.020
0,flow,1,0.010
0,flow,2,0.020
0,flow,3,0.010
0,flow,4,0.030
0,flow,5,0.030
0,demand,6,0.030
0,tank_volume,5,200.0
1,flow,0,0.030
1,flow,2,0.030
1,flow,4,0.030
1,flow,5,0.030
1,demand,6,0.030
1,tank_volume,5,200.0
2,flow,0,0.015
2,flow,1,0.015
2,flow,2,0.015
2,flow,3,0.015
2,flow,4,0.030
2,flow,5,0.030
2,demand,6,0.030
2,tank_volume,5,200.0
3,flow,1,0.020
3,flow,3,0.020
3,flow,4,0.020
3,flow,5,0.020
3,demand,6,0.020
3,tank_volume,5,200.0
";

// ── Observer wrapper to count step reports ───────────────────────────────────

struct CountingObserver<O> {
    inner:     O,
    steps:     u64,
    reversals: usize,
    unreached: usize,
}

impl<O> CountingObserver<O> {
    fn new(inner: O) -> Self {
        Self { inner, steps: 0, reversals: 0, unreached: 0 }
    }
}

impl<E, O> StepObserver<E> for CountingObserver<O>
where
    E: wq_chemistry::ChemistryEngine,
    O: StepObserver<E>,
{
    fn on_step_start(&mut self, step: Step) {
        self.inner.on_step_start(step);
    }

    fn on_step_end(&mut self, step: Step, report: &StepReport) {
        self.steps += 1;
        self.reversals += report.reversed;
        self.unreached += report.unreached_links.len();
        self.inner.on_step_end(step, report);
    }

    fn on_snapshot(
        &mut self,
        step:    Step,
        clock:   &wq_core::QualityClock,
        quality: &mut wq_sim::Quality<'_, E>,
    ) {
        self.inner.on_snapshot(step, clock, quality);
    }

    fn on_sim_end(&mut self, final_step: Step) {
        self.inner.on_sim_end(final_step);
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== chain: water quality parcel transport ===");
    println!("Hours: {SIM_HOURS}  |  Step: {TIMESTEP_SECS} s  |  Element: {ELEMENT} ({UNITS}/L)");
    println!();

    // 1. Build the pipe network.
    let (network, nodes) = build_network()?;
    println!(
        "Network: {} nodes, {} links ({} pipes)",
        network.node_count(),
        network.link_count(),
        network.pipes().count()
    );

    // 2. Load the hydraulic periods and expand them to one snapshot per step.
    let periods = load_snapshots_reader(Cursor::new(HYDRAULICS_CSV), &network)?;
    anyhow::ensure!(!periods.is_empty(), "hydraulics CSV holds no periods");
    let total_steps = SIM_HOURS * STEPS_PER_PERIOD;
    let snapshots: Vec<HydraulicSnapshot> = (0..total_steps)
        .map(|step| periods[(step / STEPS_PER_PERIOD) as usize % periods.len()].clone())
        .collect();
    println!("Loaded {} hydraulic periods → {} snapshots", periods.len(), snapshots.len());

    // 3. Source waters.
    let mut engine = IdealMixing::new();
    let background = engine.add_solution(SolutionRecord::new(7.5, 400.0, 15.0).with_total(ELEMENT, 1.0));
    let hard = engine.add_solution(
        SolutionRecord::new(7.8, 550.0, 12.0)
            .with_total(ELEMENT, 2.5)
            .with_total("Mg", 0.8),
    );
    let soft = engine.add_solution(
        SolutionRecord::new(8.1, 250.0, 14.0)
            .with_total(ELEMENT, 0.5)
            .with_total("Na", 1.2),
    );
    let inputs = InputSolutions::new()
        .with_background(background)
        .with_source(nodes.hard_source, hard)
        .with_source(nodes.soft_source, soft);

    // 4. Build and fill.
    let config = QualityConfig {
        timestep_secs:         TIMESTEP_SECS,
        total_steps,
        output_interval_steps: OUTPUT_INTERVAL_STEPS,
        ..Default::default()
    };
    let mut sim = SimulationBuilder::new(network, engine).config(config).build()?;
    let fallback = sim.fill_network(&snapshots[0], &inputs, false)?;
    info!(fallback, "network filled with background water");

    // 5. Set up output.
    let out_dir = Path::new("output/chain");
    std::fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    let writer = CsvWriter::new(out_dir)?;
    let segmentation = PipeSegmentation::new(SEGMENT_LENGTH_M)?;
    let mut obs = CountingObserver::new(SegmentObserver::new(writer, segmentation, ELEMENT, UNITS));

    // 6. Run.
    let t0 = Instant::now();
    sim.run(&snapshots, &inputs, &mut obs)?;
    let elapsed = t0.elapsed();

    if let Some(e) = obs.inner.take_error() {
        eprintln!("output error: {e}");
    }
    let released = sim.garbage_collect(Some(&inputs));

    // 7. Summary.
    println!("Simulation complete in {:.3} s ({})", elapsed.as_secs_f64(), sim.clock);
    println!("  steps             : {}", obs.steps);
    println!("  reversals         : {}", obs.reversals);
    println!("  unreached links   : {}", obs.unreached);
    println!("  solutions freed   : {released}");
    println!();

    // 8. Final node table.
    let mut quality = sim.quality();
    println!("{:<10} {:>10} {:>10} {:>8} {:>10}", "Node", "Ca mg/L", "avg", "pH", "µS/cm");
    println!("{}", "-".repeat(52));
    let rows = [
        ("hard", nodes.hard_source),
        ("soft", nodes.soft_source),
        ("blend", nodes.blend),
        ("tank", nodes.tank),
        ("consumer", nodes.consumer),
    ];
    for (name, node) in rows {
        let ca = quality.conc_node(node, ELEMENT, UNITS)?;
        let ca_avg = quality.conc_node_avg(node, ELEMENT, UNITS)?;
        let props = quality.properties_node_avg(node)?;
        println!(
            "{:<10} {:>10.3} {:>10.3} {:>8.2} {:>10.1}",
            name, ca, ca_avg, props.ph, props.conductivity
        );
    }

    Ok(())
}
