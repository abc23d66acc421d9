//! Free functions over loads shared by all node variants.

use wq_core::{Composition, Load, VOLUME_EPSILON};

/// `a + b × volume`, entry by entry.
///
/// Accumulates absolute volumes per solution; normalize the result once all
/// streams have been added.
pub fn merge_load(a: &Composition, b: &Composition, volume: f64) -> Composition {
    let mut merged = a.clone();
    merged.add_weighted(b, volume);
    merged
}

/// Blend a load sequence into one composition.
///
/// Returns the normalized composition and the total volume.  Loads with
/// non-positive volume contribute nothing.
pub fn merge_loads(loads: &[Load]) -> (Composition, f64) {
    let mut acc = Composition::new();
    let mut volume = 0.0;
    for load in loads.iter().filter(|l| l.volume > 0.0) {
        acc.add_weighted(&load.composition, load.volume);
        volume += load.volume;
    }
    (acc.normalized(), volume)
}

/// Split `mixed` across downstream links in proportion to `flows_out`.
///
/// Entry `i` of the result is the load sequence for downstream link `i`,
/// in the same inlet-first order as `mixed`.  Returns an empty `Vec` when the
/// total outgoing flow is at or below [`VOLUME_EPSILON`].
pub fn parcels_out(mixed: &[Load], flows_out: &[f64]) -> Vec<Vec<Load>> {
    let total: f64 = flows_out.iter().sum();
    if total <= VOLUME_EPSILON {
        return Vec::new();
    }
    flows_out
        .iter()
        .map(|flow| {
            let share = flow / total;
            mixed
                .iter()
                .map(|l| Load::new(l.volume * share, l.composition.clone()))
                .collect()
        })
        .collect()
}
