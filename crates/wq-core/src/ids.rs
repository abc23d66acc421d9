//! Typed ids for network elements and chemistry handles.
//!
//! Node and link ids are dense indices assigned by `NetworkBuilder`, so every
//! per-element table in the engine is a plain `Vec` indexed by `id.index()`.
//! Solution ids are opaque handles minted by the chemistry engine; they are
//! never used as indices.

use std::fmt;

macro_rules! element_id {
    ($(#[$attr:meta])* $name:ident, $prefix:literal) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        /// Short form used in logs and error messages, e.g. `N12`.
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

element_id! {
    /// A junction, reservoir or tank.
    NodeId, "N"
}

element_id! {
    /// A pipe, pump or valve.
    LinkId, "L"
}

element_id! {
    /// Handle of a solution held by the chemistry engine.
    SolutionId, "S"
}
