//! `wq-core`: foundational types for the parcel-tracking water quality engine.
//!
//! This crate is a dependency of every other `wq-*` crate.  It intentionally
//! has no `wq-*` dependencies and a single external one (`thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`ids`]         | `NodeId`, `LinkId`, `SolutionId`                          |
//! | [`composition`] | `Composition`: solution id → volume fraction             |
//! | [`parcel`]      | `Parcel` (positioned segment), `Load` (volume + mixture)  |
//! | [`inputs`]      | `InputSolutions`, `SourceKey`: per-step source mixtures  |
//! | [`time`]        | `Step`, `QualityClock`, `QualityConfig`                   |
//! | [`error`]       | `WqError`, `WqResult`                                     |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod composition;
pub mod error;
pub mod ids;
pub mod inputs;
pub mod parcel;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use composition::{Composition, FRACTION_TOLERANCE};
pub use error::{WqError, WqResult};
pub use ids::{LinkId, NodeId, SolutionId};
pub use inputs::{InputSolutions, SourceKey};
pub use parcel::{Load, Parcel, VOLUME_EPSILON, total_volume};
pub use time::{QualityClock, QualityConfig, Step};
