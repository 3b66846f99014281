// Solver adapters: concrete implementations of SolverAdapter

#[cfg(feature = "cbc")]
pub mod coin_cbc_solver;
pub mod factory;
#[cfg(feature = "highs")]
pub mod highs_solver;

#[cfg(feature = "cbc")]
pub use coin_cbc_solver::CoinCbcSolver;
pub use factory::{SolverBackend, SolverFactory};
#[cfg(feature = "highs")]
pub use highs_solver::HighsSolver;
