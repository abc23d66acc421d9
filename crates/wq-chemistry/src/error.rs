use thiserror::Error;

use wq_core::SolutionId;

#[derive(Debug, Error)]
pub enum ChemError {
    #[error("solution {0} is not known to the chemistry engine")]
    UnknownSolution(SolutionId),

    #[error("unsupported concentration units {0:?}")]
    UnsupportedUnits(String),

    #[error("element {0:?} is not known to the chemistry engine")]
    UnknownElement(String),

    #[error("cannot mix an empty composition")]
    EmptyMixture,
}

pub type ChemResult<T> = Result<T, ChemError>;
