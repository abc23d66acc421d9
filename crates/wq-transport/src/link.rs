//! The `LinkModel`: one link's parcel state.

use wq_core::{Composition, Load, Parcel, VOLUME_EPSILON, total_volume};
use wq_network::{LinkKind, Orientation};

/// Normalized positions closer than this are treated as equal.
const POSITION_EPSILON: f64 = 1e-10;

/// Transport state for a single link.
///
/// Pipes hold a parcel partition in `state`; zero-length links (pumps,
/// valves) keep `state` empty and only populate `output_state`.
#[derive(Clone, Debug)]
pub struct LinkModel {
    pub kind: LinkKind,

    /// Stored volume in m³.  Fixed at construction; 0 for zero-length links.
    pub volume: f64,

    /// Parcels ordered by ascending position (inlet first).
    pub state: Vec<Parcel>,

    /// Water that left the link during the last `push_pull`, inlet-first.
    pub output_state: Vec<Load>,

    /// Set once this link's output for the current step is final.
    pub ready: bool,

    /// Flow-consistent direction as of the last reversal check.
    pub orientation: Orientation,
}

impl LinkModel {
    pub fn new(kind: LinkKind, volume: f64, orientation: Orientation) -> Self {
        let volume = if kind.is_zero_length() { 0.0 } else { volume.max(0.0) };
        Self {
            kind,
            volume,
            state: Vec::new(),
            output_state: Vec::new(),
            ready: false,
            orientation,
        }
    }

    #[inline]
    pub fn is_zero_length(&self) -> bool {
        self.kind.is_zero_length()
    }

    #[inline]
    pub fn upstream(&self) -> wq_core::NodeId {
        self.orientation.upstream
    }

    #[inline]
    pub fn downstream(&self) -> wq_core::NodeId {
        self.orientation.downstream
    }

    /// Replace the contents with a single parcel of `composition`.
    ///
    /// The link's full volume is also reported as `output_state`, so the
    /// downstream node can be filled from it.
    pub fn fill(&mut self, composition: &Composition) {
        self.output_state = vec![Load::new(self.volume, composition.clone())];
        if self.is_zero_length() {
            self.state.clear();
        } else {
            self.state = vec![Parcel::new(0.0, 1.0, composition.clone())];
        }
    }

    /// Insert `incoming` at the inlet.
    ///
    /// Existing parcels shift downstream by the total incoming volume over
    /// the link volume.  The new parcels are laid out from `x = 0` in list
    /// order, so `incoming[0]` sits at the inlet.  Parcels are not trimmed
    /// here; positions may exceed 1 until [`push_pull`](Self::push_pull)
    /// pulls them out.  Non-positive entries are skipped; links without
    /// storage ignore the call.
    pub fn push_in(&mut self, incoming: &[Load]) {
        if self.volume <= 0.0 {
            return;
        }
        let shift = incoming
            .iter()
            .filter(|l| l.volume > 0.0)
            .map(|l| l.volume)
            .sum::<f64>()
            / self.volume;
        if shift <= 0.0 {
            return;
        }

        for p in &mut self.state {
            p.x0 += shift;
            p.x1 += shift;
        }

        let mut fresh = Vec::with_capacity(incoming.len() + self.state.len());
        let mut x = 0.0;
        for load in incoming.iter().filter(|l| l.volume > 0.0) {
            let x1 = x + load.volume / self.volume;
            fresh.push(Parcel::new(x, x1, load.composition.clone()));
            x = x1;
        }
        // Close rounding drift against the shifted parcels.
        if let Some(last) = fresh.last_mut() {
            last.x1 = shift;
        }
        fresh.append(&mut self.state);
        self.state = fresh;
    }

    /// Advance the link by one step.
    ///
    /// `flow_volume` is the volume (m³) that enters and leaves the link this
    /// step; `incoming` is the upstream node's allocation, whose total is
    /// rescaled to `flow_volume`.  If either is at or below
    /// [`VOLUME_EPSILON`] nothing moves and `output_state` is left empty.
    /// The link is marked ready in every case.
    pub fn push_pull(&mut self, flow_volume: f64, incoming: &[Load]) {
        self.output_state.clear();
        self.ready = true;

        let incoming_total = total_volume(incoming);
        if flow_volume <= VOLUME_EPSILON || incoming_total <= VOLUME_EPSILON {
            return;
        }
        let scale = flow_volume / incoming_total;
        let scaled: Vec<Load> = incoming
            .iter()
            .filter(|l| l.volume > 0.0)
            .map(|l| Load::new(l.volume * scale, l.composition.clone()))
            .collect();

        if self.is_zero_length() {
            self.output_state = scaled;
            return;
        }

        self.push_in(&scaled);
        self.pull_out();
    }

    /// Cut off everything past `x = 1` into `output_state`.
    fn pull_out(&mut self) {
        let volume = self.volume;
        let mut kept = Vec::with_capacity(self.state.len());

        for parcel in self.state.drain(..) {
            if parcel.x1 <= 1.0 + POSITION_EPSILON {
                kept.push(parcel);
                continue;
            }
            let exited = (parcel.x1 - parcel.x0.max(1.0)) * volume;
            if exited > 0.0 {
                self.output_state.push(Load::new(exited, parcel.composition.clone()));
            }
            if parcel.x0 < 1.0 - POSITION_EPSILON {
                kept.push(Parcel::new(parcel.x0, 1.0, parcel.composition));
            }
        }

        if let Some(last) = kept.last_mut()
            && last.x1 > 1.0 - POSITION_EPSILON
        {
            last.x1 = 1.0;
        }
        self.state = kept;
    }

    /// Mirror the partition for a new flow direction.
    ///
    /// Each parcel `(x0, x1)` becomes `(1 − x1, 1 − x0)` and the list is
    /// re-sorted.  If `orientation` already matches the stored one the
    /// positions are left alone, so repeated calls for the same direction
    /// are harmless.
    pub fn reverse_parcels(&mut self, orientation: Orientation) {
        if orientation != self.orientation {
            for p in &mut self.state {
                let (x0, x1) = (1.0 - p.x1, 1.0 - p.x0);
                p.x0 = x0.max(0.0);
                p.x1 = x1.min(1.0);
            }
            self.orientation = orientation;
        }
        self.state.sort_by(|a, b| a.x0.total_cmp(&b.x0));
    }

    /// Volume currently stored, m³.
    pub fn stored_volume(&self) -> f64 {
        self.state.iter().map(|p| p.span()).sum::<f64>() * self.volume
    }

    /// Volume that left during the last step, m³.
    pub fn exited_volume(&self) -> f64 {
        total_volume(&self.output_state)
    }

    /// `true` if `state` is sorted, gap-free and spans `[0, 1]` within `tol`
    /// (or is empty).
    pub fn is_partition(&self, tol: f64) -> bool {
        let (Some(first), Some(last)) = (self.state.first(), self.state.last()) else {
            return true;
        };
        first.x0.abs() <= tol
            && (last.x1 - 1.0).abs() <= tol
            && self.state.iter().all(|p| p.x1 > p.x0)
            && self.state.windows(2).all(|w| (w[1].x0 - w[0].x1).abs() <= tol)
    }
}
