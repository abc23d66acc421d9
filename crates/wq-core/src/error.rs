//! Framework error type.
//!
//! Sub-crates may define their own error enums and convert `WqError` into
//! them via `From` impls (see `wq-sim::SimError`), or use it directly.

use thiserror::Error;

use crate::{LinkId, NodeId};

/// The top-level error type for `wq-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum WqError {
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("link {0} not found")]
    LinkNotFound(LinkId),

    #[error("no source solution defined for {0}")]
    MissingSource(NodeId),

    #[error("no background solution defined (reserved key `Background`)")]
    MissingBackground,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `wq-*` crates.
pub type WqResult<T> = Result<T, WqError>;
