//! `SegmentObserver<W>`: bridges `StepObserver` to an `OutputWriter`.

use tracing::debug;
use wq_chemistry::ChemistryEngine;
use wq_core::{QualityClock, Step};
use wq_sim::{Quality, StepObserver};

use crate::{OutputError, OutputResult, OutputWriter, PipeSegmentation};

/// A [`StepObserver`] that writes pipe segment concentrations of one element
/// to any [`OutputWriter`] backend.
///
/// Pipe metadata is written on the first snapshot.  Errors from the writer
/// or the queries are stored because observer hooks have no return value;
/// after `sim.run()` returns, check with [`take_error`](Self::take_error).
/// Only the first error is kept.
pub struct SegmentObserver<W: OutputWriter> {
    writer:           W,
    segmentation:     PipeSegmentation,
    element:          String,
    units:            String,
    metadata_written: bool,
    last_error:       Option<OutputError>,
}

impl<W: OutputWriter> SegmentObserver<W> {
    pub fn new(writer: W, segmentation: PipeSegmentation, element: &str, units: &str) -> Self {
        Self {
            writer,
            segmentation,
            element:          element.to_owned(),
            units:            units.to_owned(),
            metadata_written: false,
            last_error:       None,
        }
    }

    /// Take the stored error (if any) after `sim.run()` returns.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result
            && self.last_error.is_none()
        {
            self.last_error = Some(e);
        }
    }

    fn write_snapshot<E: ChemistryEngine>(
        &mut self,
        step:    Step,
        clock:   &QualityClock,
        quality: &mut Quality<'_, E>,
    ) -> OutputResult<()> {
        if !self.metadata_written {
            let metadata = self.segmentation.pipe_metadata(quality.network());
            self.writer.write_metadata(&metadata)?;
            self.metadata_written = true;
        }
        let rows = self.segmentation.segment_network(
            quality,
            &self.element,
            &self.units,
            Some(step),
            Some(clock.elapsed_secs),
        )?;
        debug!(%step, rows = rows.len(), "segment snapshot");
        self.writer.write_segments(&rows)
    }
}

impl<W: OutputWriter, E: ChemistryEngine> StepObserver<E> for SegmentObserver<W> {
    fn on_snapshot(&mut self, step: Step, clock: &QualityClock, quality: &mut Quality<'_, E>) {
        let result = self.write_snapshot(step, clock, quality);
        self.store_err(result);
    }

    fn on_sim_end(&mut self, _final_step: Step) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
