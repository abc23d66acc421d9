//! Plain data row types written by output backends.

use wq_core::{LinkId, Step};

use crate::Segment;

/// One pipe segment at one recorded step.
///
/// `step` and `time_s` are `None` for one-off profiles taken outside a
/// recording loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentRow {
    pub link:      u32,
    pub step:      Option<u64>,
    pub time_s:    Option<f64>,
    /// 1-based, counted from the current inlet.
    pub seg_id:    u32,
    pub x_start_m: f64,
    pub x_end_m:   f64,
    pub x_mid_m:   f64,
    pub length_m:  f64,
    pub conc:      f64,
    pub n_parcels: u32,
}

impl SegmentRow {
    pub fn new(link: LinkId, step: Option<Step>, time_s: Option<f64>, seg: &Segment) -> Self {
        Self {
            link:      link.0,
            step:      step.map(|s| s.0),
            time_s,
            seg_id:    seg.seg_id,
            x_start_m: seg.x_start_m,
            x_end_m:   seg.x_end_m,
            x_mid_m:   seg.x_mid_m,
            length_m:  seg.length_m,
            conc:      seg.conc,
            n_parcels: seg.n_parcels,
        }
    }
}

/// How one pipe is divided into segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipeMetadataRow {
    pub link:          u32,
    pub pipe_length_m: f64,
    pub seg_length_m:  f64,
    pub n_segs:        u32,
    /// Length of the final (possibly shorter) segment.
    pub last_seg_m:    f64,
}
