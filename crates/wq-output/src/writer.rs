//! The `OutputWriter` trait implemented by all backend writers.

use crate::{OutputResult, PipeMetadataRow, SegmentRow};

/// Trait implemented by the CSV and SQLite writers.
///
/// When driven by [`SegmentObserver`](crate::SegmentObserver), errors are
/// stored and retrieved with
/// [`SegmentObserver::take_error`](crate::SegmentObserver::take_error).
pub trait OutputWriter {
    /// Write a batch of segment rows.
    fn write_segments(&mut self, rows: &[SegmentRow]) -> OutputResult<()>;

    /// Write the per-pipe segmentation summary.
    fn write_metadata(&mut self, rows: &[PipeMetadataRow]) -> OutputResult<()>;

    /// Flush and close all underlying handles.
    ///
    /// Idempotent: safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
