// Solver adapter boundary.
//
// The modeling core never sees a solving algorithm. It hands a complete,
// self-contained Model to a SolverAdapter and receives a complete,
// self-contained Solution back; any conforming backend can be plugged in
// behind this trait without touching the core.

use std::time::Duration;

use super::model::{Model, ModelError, VariableId};
use super::value_objects::{SolutionStatus, VariableType};

/// Errors from the solver boundary itself. Solve outcomes are not
/// errors: an infeasible model is a [`SolutionStatus`].
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("solver not available: {0}")]
    SolverNotAvailable(String),

    #[error("solver execution failed: {0}")]
    ExecutionFailed(String),
}

/// Everything that can go wrong in [`Model::solve`]: contract violations
/// caught by the model, or a backend failure.
#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// Per-solve options passed through to the backend.
#[derive(Debug, Clone, Default)]
pub struct SolveOptions {
    /// Wall-clock budget; on expiry the backend reports
    /// [`SolutionStatus::NotSolved`] instead of blocking indefinitely.
    pub time_limit: Option<Duration>,
    /// Relative MIP gap at which the backend may stop.
    pub gap_tolerance: Option<f64>,
    /// Let the backend print its own log.
    pub verbose: bool,
}

/// Contract for optimization backends.
pub trait SolverAdapter: Send + Sync {
    /// Solve the model, synchronously. Feasibility verdicts travel inside
    /// the returned [`Solution`]; `Err` is reserved for backend failures.
    fn solve(&self, model: &Model, options: &SolveOptions) -> Result<Solution, SolverError>;

    /// Human-readable backend name.
    fn name(&self) -> &str;

    /// Whether the backend handles integer and binary variables.
    fn supports_mip(&self) -> bool;
}

/// Counts and timing recorded by an adapter for one solve.
#[derive(Debug, Clone, Default)]
pub struct SolverStatistics {
    pub solve_time_ms: f64,
    pub num_variables: u32,
    pub num_constraints: u32,
    pub num_integer_vars: u32,
    pub num_binary_vars: u32,
}

impl SolverStatistics {
    /// Statistics for a model, with the elapsed solve time filled in.
    pub fn for_model(model: &Model, solve_time_ms: f64) -> Self {
        let count = |t: VariableType| {
            model
                .variables()
                .iter()
                .filter(|v| v.variable_type() == t)
                .count() as u32
        };
        Self {
            solve_time_ms,
            num_variables: model.num_variables() as u32,
            num_constraints: model.num_constraints() as u32,
            num_integer_vars: count(VariableType::Integer),
            num_binary_vars: count(VariableType::Binary),
        }
    }
}

/// Result of one solve: a status, and an objective value plus variable
/// assignment when (and only when) the status is `Optimal`. Created
/// exclusively by solver adapters; immutable afterwards.
#[derive(Debug, Clone)]
pub struct Solution {
    status: SolutionStatus,
    objective_value: Option<f64>,
    values: Option<Vec<f64>>,
    model: u64,
    message: String,
    statistics: SolverStatistics,
}

impl Solution {
    /// An optimal solution with a full column assignment for `model`.
    pub fn optimal(model: &Model, objective_value: f64, values: Vec<f64>) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            objective_value: Some(objective_value),
            values: Some(values),
            model: model.model_id(),
            message: format!("optimal solution found for '{}'", model.name()),
            statistics: SolverStatistics::default(),
        }
    }

    /// A non-optimal outcome (infeasible, unbounded, or not solved);
    /// carries no objective value and no assignment.
    pub fn without_assignment(
        model: &Model,
        status: SolutionStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            objective_value: None,
            values: None,
            model: model.model_id(),
            message: message.into(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn with_statistics(mut self, statistics: SolverStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn status(&self) -> SolutionStatus {
        self.status
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    /// Objective value, present iff the status is `Optimal`.
    pub fn objective_value(&self) -> Option<f64> {
        self.objective_value
    }

    /// Assigned value of `variable`: `None` unless the solve was optimal
    /// and the variable belongs to the solved model.
    pub fn value(&self, variable: VariableId) -> Option<f64> {
        if variable.model_id() != self.model {
            return None;
        }
        self.values.as_ref()?.get(variable.column()).copied()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn statistics(&self) -> &SolverStatistics {
        &self.statistics
    }
}
