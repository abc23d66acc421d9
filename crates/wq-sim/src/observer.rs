//! Step observer trait for progress reporting and data collection.

use wq_chemistry::ChemistryEngine;
use wq_core::{QualityClock, Step};

use crate::{Quality, StepReport};

/// Callbacks invoked by [`Simulation::run`][crate::Simulation::run] at key
/// points in the step loop.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: reversal logger
///
/// ```rust,ignore
/// struct Reversals(usize);
///
/// impl<E: ChemistryEngine> StepObserver<E> for Reversals {
///     fn on_step_end(&mut self, _step: Step, report: &StepReport) {
///         self.0 += report.reversed;
///     }
/// }
/// ```
pub trait StepObserver<E: ChemistryEngine> {
    /// Called before the step's flow-direction check.
    fn on_step_start(&mut self, _step: Step) {}

    /// Called once the step has completed and readiness is reset.
    fn on_step_end(&mut self, _step: Step, _report: &StepReport) {}

    /// Called every `config.output_interval_steps` completed steps.
    ///
    /// `step` is the number of steps completed so far.  The query view gives
    /// writers access to parcel state and the chemistry engine without the
    /// simulation knowing about any output format.
    fn on_snapshot(&mut self, _step: Step, _clock: &QualityClock, _quality: &mut Quality<'_, E>) {}

    /// Called once after the final step.
    fn on_sim_end(&mut self, _final_step: Step) {}
}

/// A [`StepObserver`] that does nothing.
pub struct NoopObserver;

impl<E: ChemistryEngine> StepObserver<E> for NoopObserver {}
