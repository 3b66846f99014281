// Domain layer: modeling vocabulary (records, expressions, models) and
// the solver adapter contract
pub mod domain;

// Application layer: the six scenario builders and their reports
pub mod application;

// Infrastructure layer: external concerns (dataset input)
pub mod infrastructure;

// Solver adapters: concrete implementations of SolverAdapter
#[cfg(any(feature = "highs", feature = "cbc"))]
pub mod solver;

// Re-export commonly used types
pub use domain::{
    AttrValue, Constraint, ConstraintType, DataError, Expression, Model, ModelError, Objective,
    OptimizationType, Record, RecordStore, Reducer, Solution, SolutionStatus, SolveError,
    SolveOptions, SolverAdapter, SolverError, SolverStatistics, Variable, VariableId,
    VariableSpec, VariableType,
};

pub use application::{currency, ScenarioError, ScenarioResult};

pub use infrastructure::{load_insurance_csv, read_insurance_records, DatasetError};

#[cfg(feature = "cbc")]
pub use solver::CoinCbcSolver;
#[cfg(any(feature = "highs", feature = "cbc"))]
pub use solver::{SolverBackend, SolverFactory};
#[cfg(feature = "highs")]
pub use solver::HighsSolver;
