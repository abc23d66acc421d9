//! Source solutions supplied by the caller for fill and each step.

use std::collections::BTreeMap;

use crate::{NodeId, SolutionId, WqError, WqResult};

/// Key into [`InputSolutions`].
///
/// `Background` is the reserved sentinel for the fallback water used to fill
/// links that no source reaches.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SourceKey {
    Background,
    Node(NodeId),
}

/// Per-source solution handles: one per reservoir, plus the background.
///
/// # Example
///
/// ```
/// use wq_core::{InputSolutions, NodeId, SolutionId};
///
/// let inputs = InputSolutions::new()
///     .with_background(SolutionId(0))
///     .with_source(NodeId(3), SolutionId(1));
/// assert_eq!(inputs.source(NodeId(3)).unwrap(), SolutionId(1));
/// assert!(inputs.source(NodeId(4)).is_err());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InputSolutions(BTreeMap<SourceKey, SolutionId>);

impl InputSolutions {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with_background(mut self, solution: SolutionId) -> Self {
        self.0.insert(SourceKey::Background, solution);
        self
    }

    pub fn with_source(mut self, node: NodeId, solution: SolutionId) -> Self {
        self.0.insert(SourceKey::Node(node), solution);
        self
    }

    /// Insert or replace a single entry; returns the previous handle.
    pub fn insert(&mut self, key: SourceKey, solution: SolutionId) -> Option<SolutionId> {
        self.0.insert(key, solution)
    }

    pub fn get(&self, key: SourceKey) -> Option<SolutionId> {
        self.0.get(&key).copied()
    }

    /// The fallback solution.
    ///
    /// # Errors
    ///
    /// [`WqError::MissingBackground`] if no background entry was supplied.
    pub fn background(&self) -> WqResult<SolutionId> {
        self.get(SourceKey::Background).ok_or(WqError::MissingBackground)
    }

    /// The solution injected by source node `node`.
    ///
    /// # Errors
    ///
    /// [`WqError::MissingSource`] if `node` has no entry.
    pub fn source(&self, node: NodeId) -> WqResult<SolutionId> {
        self.get(SourceKey::Node(node)).ok_or(WqError::MissingSource(node))
    }

    /// Every handle referenced, background included.
    pub fn solutions(&self) -> impl Iterator<Item = SolutionId> + '_ {
        self.0.values().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
