//! `wq-output`: pipe segmentation and output writers for the water quality
//! engine.
//!
//! Two backends are provided:
//!
//! | Feature   | Backend | Files created                          |
//! |-----------|---------|----------------------------------------|
//! | *(none)*  | CSV     | `segments.csv`, `pipe_metadata.csv`    |
//! | `sqlite`  | SQLite  | `output.db`                            |
//!
//! Both implement [`OutputWriter`] and are driven by [`SegmentObserver`],
//! which implements `wq_sim::StepObserver`.  [`PipeSegmentation`] can also
//! be used directly to bin a single pipe or to buffer a time series in
//! memory.
//!
//! # Usage
//!
//! ```rust,ignore
//! use wq_output::{CsvWriter, PipeSegmentation, SegmentObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = SegmentObserver::new(writer, PipeSegmentation::new(6.0)?, "Ca", "mg");
//! sim.run(&snapshots, &inputs, &mut obs)?;
//! if let Some(e) = obs.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod segment;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use self::csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::SegmentObserver;
pub use row::{PipeMetadataRow, SegmentRow};
pub use segment::{PipeSegmentation, Segment};
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;
