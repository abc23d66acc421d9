//! `wq-mixing`: what happens to water at a node.
//!
//! # Crate layout
//!
//! | Module   | Contents                                                         |
//! |----------|------------------------------------------------------------------|
//! | [`load`] | `merge_load`, `merge_loads`, `parcels_out`: shared helpers       |
//! | [`tank`] | `CstrTank`, `LayeredTank` (FIFO / LIFO): persistent tank state  |
//! | [`node`] | `NodeModel`, `Mixer`, `MixInput`                                 |
//!
//! # Mixing contract
//!
//! Every node variant consumes one step's inflow (the concatenated
//! `output_state` of its upstream links) and produces:
//!
//! - `mixed_parcels`: what leaves the node this step, inlet-first.
//! - `outflow`: `mixed_parcels` split across the downstream links in
//!   proportion to their flow.
//!
//! Junctions and reservoirs are memoryless; tanks carry state across steps.

pub mod load;
pub mod node;
pub mod tank;


pub use load::{merge_load, merge_loads, parcels_out};
pub use node::{MixInput, Mixer, NodeModel};
pub use tank::{CstrTank, Discipline, LayeredTank};
