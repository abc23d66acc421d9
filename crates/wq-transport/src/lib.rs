//! `wq-transport`: per-link parcel transport.
//!
//! # Crate layout
//!
//! | Module   | Contents                                                        |
//! |----------|-----------------------------------------------------------------|
//! | [`link`] | `LinkModel`: parcel partition, push/pull, flow reversal        |
//!
//! # Transport model (plug flow)
//!
//! A pipe's contents are an ordered, gap-free partition of `[0, 1]` into
//! [`Parcel`](wq_core::Parcel)s.  Each step:
//!
//! 1. The upstream node's outflow for this link is rescaled to the step's
//!    flow volume and pushed in at `x = 0`, shifting everything downstream
//!    by `volume / link_volume`.
//! 2. Whatever now lies past `x = 1` is cut off and becomes the link's
//!    `output_state`, which the downstream node mixes.
//!
//! Pumps and valves store nothing: their `output_state` is the incoming
//! sequence rescaled to the flow volume.

pub mod link;


pub use link::LinkModel;
