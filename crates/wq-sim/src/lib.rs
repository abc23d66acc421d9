//! `wq-sim`: step scheduler and simulation facade for the water quality
//! engine.
//!
//! # Step loop
//!
//! ```text
//! for step in 0..config.total_steps:
//!   ① Validate:  timestep > 0, snapshot matches the network, every
//!                reservoir has a source solution.
//!   ② Direction: links whose flow sign flipped mirror their parcels;
//!                adjacency is rebuilt.
//!   ③ Traverse:  from every reservoir (and every node without inflow):
//!                a node mixes once all upstream links are ready, then
//!                push_pull runs on each downstream link.
//!   ④ Reset:     readiness flags cleared; clock advanced.
//! ```
//!
//! # Crate layout
//!
//! | Module       | Contents                                                 |
//! |--------------|----------------------------------------------------------|
//! | [`registry`] | `Registry`: one `LinkModel` / `NodeModel` per element   |
//! | [`solver`]   | `Solver`: direction check, traversal, fill; `StepReport` |
//! | [`quality`]  | `Quality`: concentration, mixture and property queries  |
//! | [`sim`]      | `Simulation`: step, run, fill, garbage collection       |
//! | [`builder`]  | `SimulationBuilder`                                      |
//! | [`observer`] | `StepObserver`, `NoopObserver`                           |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use wq_chemistry::IdealMixing;
//! use wq_sim::{NoopObserver, SimulationBuilder};
//!
//! let mut sim = SimulationBuilder::new(network, IdealMixing::new()).build()?;
//! sim.fill_network(&snapshots[0], &inputs, true)?;
//! sim.run(&snapshots, &inputs, &mut NoopObserver)?;
//! let ca = sim.quality().conc_node(junction, "Ca", "mg")?;
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod quality;
pub mod registry;
pub mod sim;
pub mod solver;

#[cfg(test)]
mod tests;

pub use builder::SimulationBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, StepObserver};
pub use quality::{ParcelConc, Quality};
pub use registry::Registry;
pub use sim::Simulation;
pub use solver::{Solver, StepReport};
