//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `segments.csv`
//! - `pipe_metadata.csv`
//!
//! Missing `step` / `time_s` values are written as empty fields.

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{OutputResult, PipeMetadataRow, SegmentRow};

pub const SEGMENT_HEADERS: [&str; 10] = [
    "link", "step", "time_s", "seg_id", "x_start_m", "x_end_m", "x_mid_m", "length_m", "conc",
    "n_parcels",
];

pub const METADATA_HEADERS: [&str; 5] =
    ["link", "pipe_length_m", "seg_length_m", "n_segs", "last_seg_m"];

fn opt<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes segment output to two CSV files.
pub struct CsvWriter {
    segments: Writer<File>,
    metadata: Writer<File>,
    finished: bool,
}

impl CsvWriter {
    /// Create the two CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut segments = Writer::from_path(dir.join("segments.csv"))?;
        segments.write_record(SEGMENT_HEADERS)?;

        let mut metadata = Writer::from_path(dir.join("pipe_metadata.csv"))?;
        metadata.write_record(METADATA_HEADERS)?;

        Ok(Self { segments, metadata, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_segments(&mut self, rows: &[SegmentRow]) -> OutputResult<()> {
        for row in rows {
            self.segments.write_record(&[
                row.link.to_string(),
                opt(row.step),
                opt(row.time_s),
                row.seg_id.to_string(),
                row.x_start_m.to_string(),
                row.x_end_m.to_string(),
                row.x_mid_m.to_string(),
                row.length_m.to_string(),
                row.conc.to_string(),
                row.n_parcels.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_metadata(&mut self, rows: &[PipeMetadataRow]) -> OutputResult<()> {
        for row in rows {
            self.metadata.write_record(&[
                row.link.to_string(),
                row.pipe_length_m.to_string(),
                row.seg_length_m.to_string(),
                row.n_segs.to_string(),
                row.last_seg_m.to_string(),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.segments.flush()?;
        self.metadata.flush()?;
        Ok(())
    }
}
