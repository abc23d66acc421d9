//! `wq-chemistry`: the boundary to the external chemistry engine.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                      |
//! |------------|---------------------------------------------------------------|
//! | [`engine`] | `ChemistryEngine` trait, `Units`, `Properties`                |
//! | [`ideal`]  | `IdealMixing`: linear-mixing reference engine, `SolutionRecord` |
//! | [`error`]  | `ChemError`, `ChemResult<T>`                                  |
//!
//! # Design notes
//!
//! Solution handles ([`wq_core::SolutionId`]) are owned by the engine.  The
//! transport layer only copies them into parcel compositions; releasing
//! handles nothing references any more is the job of
//! `Simulation::garbage_collect`, which calls
//! [`ChemistryEngine::remove_solutions`].

pub mod engine;
pub mod error;
pub mod ideal;


pub use engine::{ChemistryEngine, Properties, Units};
pub use error::{ChemError, ChemResult};
pub use ideal::{IdealMixing, SolutionRecord};
