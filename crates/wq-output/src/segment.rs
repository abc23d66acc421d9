//! Fixed-length pipe segmentation.
//!
//! A pipe of length `L` split at segment length `S` has `ceil(L / S)`
//! segments; the last is `L − S·(n − 1)` long.  Each segment's
//! concentration is the overlap-weighted sum of the parcel concentrations
//! it covers, divided by the segment length.

use wq_chemistry::ChemistryEngine;
use wq_core::{LinkId, Step};
use wq_network::Network;
use wq_sim::{ParcelConc, Quality, SimError};

use crate::{OutputError, OutputResult, PipeMetadataRow, SegmentRow};

/// One segment of one pipe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// 1-based, counted from the current inlet.
    pub seg_id:    u32,
    pub x_start_m: f64,
    pub x_end_m:   f64,
    pub x_mid_m:   f64,
    pub length_m:  f64,
    pub conc:      f64,
    /// Parcels that overlap the segment by a positive length.
    pub n_parcels: u32,
}

/// Positions are reported to the micrometre.
fn round_um(x: f64) -> f64 {
    (x * 1e6).round() / 1e6
}

/// Segment calculator plus an append-only time-series buffer.
#[derive(Debug, Clone)]
pub struct PipeSegmentation {
    seg_length_m: f64,
    records:      Vec<SegmentRow>,
}

impl PipeSegmentation {
    /// # Errors
    ///
    /// [`OutputError::InvalidSegmentLength`] unless `seg_length_m` is
    /// positive and finite.
    pub fn new(seg_length_m: f64) -> OutputResult<Self> {
        if seg_length_m <= 0.0 || !seg_length_m.is_finite() {
            return Err(OutputError::InvalidSegmentLength(seg_length_m));
        }
        Ok(Self { seg_length_m, records: Vec::new() })
    }

    pub fn seg_length_m(&self) -> f64 {
        self.seg_length_m
    }

    /// Number of segments for a pipe of `length_m` (0 if not positive).
    pub fn segment_count(&self, length_m: f64) -> u32 {
        if length_m <= 0.0 {
            return 0;
        }
        (length_m / self.seg_length_m).ceil() as u32
    }

    /// Bin a concentration profile into segments.
    ///
    /// `parcels` uses normalized positions along a pipe of `length_m`.
    /// Returns nothing for a non-positive length or an empty profile.
    pub fn segment_profile(&self, length_m: f64, parcels: &[ParcelConc]) -> Vec<Segment> {
        if length_m <= 0.0 || parcels.is_empty() {
            return Vec::new();
        }

        (0..self.segment_count(length_m))
            .map(|i| {
                let s0 = f64::from(i) * self.seg_length_m;
                let s1 = (s0 + self.seg_length_m).min(length_m);
                let (x0, x1) = (s0 / length_m, s1 / length_m);

                let mut weighted = 0.0;
                let mut n_parcels = 0;
                for p in parcels {
                    let overlap = p.x1.min(x1) - p.x0.max(x0);
                    if overlap > 0.0 {
                        weighted += p.conc * overlap;
                        n_parcels += 1;
                    }
                }
                let span = x1 - x0;

                Segment {
                    seg_id:    i + 1,
                    x_start_m: round_um(s0),
                    x_end_m:   round_um(s1),
                    x_mid_m:   round_um(0.5 * (s0 + s1)),
                    length_m:  round_um(s1 - s0),
                    conc:      if span > 0.0 { weighted / span } else { 0.0 },
                    n_parcels,
                }
            })
            .collect()
    }

    /// Segment the current contents of `link`.
    ///
    /// Pumps, valves and pipes without length yield no segments.
    pub fn segment_pipe<E: ChemistryEngine>(
        &self,
        quality: &mut Quality<'_, E>,
        link:    LinkId,
        element: &str,
        units:   &str,
    ) -> OutputResult<Vec<Segment>> {
        let kind = quality.network().link(link).map_err(SimError::from)?;
        let length_m = quality.network().link_length_m[link.index()];
        if kind.is_zero_length() || length_m <= 0.0 {
            return Ok(Vec::new());
        }
        let profile = quality.conc_link_profile(link, element, units)?;
        Ok(self.segment_profile(length_m, &profile))
    }

    /// Segment every pipe, tagging rows with `step` and `time_s`.
    pub fn segment_network<E: ChemistryEngine>(
        &self,
        quality: &mut Quality<'_, E>,
        element: &str,
        units:   &str,
        step:    Option<Step>,
        time_s:  Option<f64>,
    ) -> OutputResult<Vec<SegmentRow>> {
        let pipes: Vec<LinkId> = quality.network().pipes().collect();
        let mut rows = Vec::new();
        for link in pipes {
            for seg in self.segment_pipe(quality, link, element, units)? {
                rows.push(SegmentRow::new(link, step, time_s, &seg));
            }
        }
        Ok(rows)
    }

    /// Append the current segmentation to the buffer.  Returns the number of
    /// rows added.
    pub fn record_step<E: ChemistryEngine>(
        &mut self,
        quality: &mut Quality<'_, E>,
        element: &str,
        units:   &str,
        step:    Option<Step>,
        time_s:  Option<f64>,
    ) -> OutputResult<usize> {
        let rows = self.segment_network(quality, element, units, step, time_s)?;
        let n = rows.len();
        self.records.extend(rows);
        Ok(n)
    }

    /// Everything recorded so far.  Does not clear the buffer.
    pub fn records(&self) -> &[SegmentRow] {
        &self.records
    }

    pub fn reset(&mut self) {
        self.records.clear();
    }

    /// Segment counts for every pipe with positive length.
    pub fn pipe_metadata(&self, network: &Network) -> Vec<PipeMetadataRow> {
        network
            .pipes()
            .filter_map(|link| {
                let length_m = network.link_length_m[link.index()];
                if length_m <= 0.0 {
                    return None;
                }
                let n_segs = self.segment_count(length_m);
                Some(PipeMetadataRow {
                    link: link.0,
                    pipe_length_m: length_m,
                    seg_length_m: self.seg_length_m,
                    n_segs,
                    last_seg_m: round_um(length_m - f64::from(n_segs - 1) * self.seg_length_m),
                })
            })
            .collect()
    }
}
