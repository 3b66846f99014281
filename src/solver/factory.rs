use std::fmt;

use crate::domain::solver_service::{SolverAdapter, SolverError};

#[cfg(feature = "cbc")]
use super::coin_cbc_solver::CoinCbcSolver;
#[cfg(feature = "highs")]
use super::highs_solver::HighsSolver;

/// Solver backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverBackend {
    /// Automatically select the preferred compiled-in backend
    Auto,
    /// HiGHS
    Highs,
    /// COIN-OR CBC
    CoinCbc,
}

impl fmt::Display for SolverBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverBackend::Auto => write!(f, "Auto"),
            SolverBackend::Highs => write!(f, "HiGHS"),
            SolverBackend::CoinCbc => write!(f, "COIN-OR CBC"),
        }
    }
}

/// Factory for creating solver adapters from a backend selection
pub struct SolverFactory;

impl SolverFactory {
    /// Create an adapter for a specific backend. Requesting a backend
    /// whose feature was not compiled in fails with `SolverNotAvailable`.
    pub fn create(backend: SolverBackend) -> Result<Box<dyn SolverAdapter>, SolverError> {
        match backend {
            SolverBackend::Auto => Self::auto(),
            SolverBackend::Highs => {
                #[cfg(feature = "highs")]
                {
                    Ok(Box::new(HighsSolver::new()))
                }
                #[cfg(not(feature = "highs"))]
                {
                    Err(SolverError::SolverNotAvailable(
                        "HiGHS support was not compiled in (enable the 'highs' feature)"
                            .to_string(),
                    ))
                }
            }
            SolverBackend::CoinCbc => {
                #[cfg(feature = "cbc")]
                {
                    Ok(Box::new(CoinCbcSolver::new()))
                }
                #[cfg(not(feature = "cbc"))]
                {
                    Err(SolverError::SolverNotAvailable(
                        "CBC support was not compiled in (enable the 'cbc' feature)".to_string(),
                    ))
                }
            }
        }
    }

    /// The default backend (HiGHS when available).
    pub fn default_solver() -> Result<Box<dyn SolverAdapter>, SolverError> {
        Self::auto()
    }

    fn auto() -> Result<Box<dyn SolverAdapter>, SolverError> {
        #[cfg(feature = "highs")]
        return Ok(Box::new(HighsSolver::new()));
        #[cfg(all(feature = "cbc", not(feature = "highs")))]
        return Ok(Box::new(CoinCbcSolver::new()));
        #[cfg(not(any(feature = "highs", feature = "cbc")))]
        Err(SolverError::SolverNotAvailable(
            "no solver backend was compiled in".to_string(),
        ))
    }
}
