//! `wq-network`: pipe network topology and per-step hydraulic inputs.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                      |
//! |--------------|---------------------------------------------------------------|
//! | [`network`]  | `Network` (SoA element tables), `NetworkBuilder`, `pipe_volume` |
//! | [`snapshot`] | `HydraulicSnapshot` (flows, demands, tank volumes), `Orientation` |
//! | [`loader`]   | `load_snapshots_csv` / `load_snapshots_reader`                |
//!
//! The hydraulic solve itself is external: this crate only stores its
//! results.  Errors are reported as [`wq_core::WqError`].

pub mod loader;
pub mod network;
pub mod snapshot;


pub use loader::{load_snapshots_csv, load_snapshots_reader};
pub use network::{LinkKind, Network, NetworkBuilder, NodeKind, TankMixing, pipe_volume};
pub use snapshot::{HydraulicSnapshot, Orientation};
