use thiserror::Error;

use wq_chemistry::ChemError;
use wq_core::WqError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("timestep must be positive and finite, got {0}")]
    InvalidTimestep(f64),

    #[error(transparent)]
    Core(#[from] WqError),

    #[error("chemistry engine error: {0}")]
    Chemistry(#[from] ChemError),
}

pub type SimResult<T> = Result<T, SimError>;
