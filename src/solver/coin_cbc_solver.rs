// COIN-OR CBC solver adapter, via good_lp.
// good_lp minimizes, so maximization is translated by negating the
// objective; the reported value is recomputed from the assignment.

use std::time::Instant;

use good_lp::{
    solvers::coin_cbc, variable, variables, Expression as LpExpression, ResolutionError,
    Solution as LpSolution, SolverModel, Variable as LpVariable,
};

use crate::domain::{
    model::Model,
    solver_service::{Solution, SolveOptions, SolverAdapter, SolverError, SolverStatistics},
    value_objects::{ConstraintType, OptimizationType, SolutionStatus},
};

pub struct CoinCbcSolver;

impl CoinCbcSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CoinCbcSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverAdapter for CoinCbcSolver {
    fn solve(&self, model: &Model, options: &SolveOptions) -> Result<Solution, SolverError> {
        let objective = model
            .objective()
            .ok_or_else(|| SolverError::ExecutionFailed("model has no objective".to_string()))?;

        let start_time = Instant::now();

        let mut vars = variables!();
        let mut lp_variables: Vec<LpVariable> = Vec::with_capacity(model.num_variables());
        for def in model.variables() {
            let lower = def.lower_bound();
            let upper = def.upper_bound().unwrap_or(f64::INFINITY);
            let var = if def.is_integer() {
                vars.add(variable().integer().min(lower).max(upper))
            } else {
                vars.add(variable().min(lower).max(upper))
            };
            lp_variables.push(var);
        }

        let is_maximize = objective.optimization_type() == OptimizationType::Maximize;
        let mut objective_expr: LpExpression = 0.into();
        for (var, coeff) in objective.expression().terms() {
            let c = if is_maximize { -coeff } else { coeff };
            objective_expr += c * lp_variables[var.column()];
        }

        let mut lp_model = vars.minimise(objective_expr).using(coin_cbc::coin_cbc);
        if !options.verbose {
            lp_model.set_parameter("log", "0");
        }
        if let Some(limit) = options.time_limit {
            lp_model.set_parameter("sec", &limit.as_secs_f64().to_string());
        }
        if let Some(gap) = options.gap_tolerance {
            lp_model.set_parameter("ratio", &gap.to_string());
        }

        for constraint in model.constraints() {
            let mut lhs: LpExpression = 0.into();
            for (var, coeff) in constraint.terms() {
                lhs += coeff * lp_variables[var.column()];
            }
            let bound = constraint.bound();
            lp_model = match constraint.constraint_type() {
                ConstraintType::LessThanOrEqual => lp_model.with(lhs.leq(bound)),
                ConstraintType::Equal => lp_model.with(lhs.eq(bound)),
                ConstraintType::GreaterThanOrEqual => lp_model.with(lhs.geq(bound)),
            };
        }

        let solved = lp_model.solve();
        let solve_time = start_time.elapsed().as_secs_f64() * 1000.0;
        let statistics = SolverStatistics::for_model(model, solve_time);
        tracing::debug!(
            model = model.name(),
            solve_time_ms = solve_time,
            "CBC solve finished"
        );

        match solved {
            Ok(sol) => {
                let values: Vec<f64> = lp_variables.iter().map(|&v| sol.value(v)).collect();

                let mut objective_value = objective.expression().constant_term();
                for (var, coeff) in objective.expression().terms() {
                    objective_value += coeff * values[var.column()];
                }

                Ok(Solution::optimal(model, objective_value, values).with_statistics(statistics))
            }
            Err(ResolutionError::Infeasible) => Ok(Solution::without_assignment(
                model,
                SolutionStatus::Infeasible,
                "no assignment satisfies all constraints",
            )
            .with_statistics(statistics)),
            Err(ResolutionError::Unbounded) => Ok(Solution::without_assignment(
                model,
                SolutionStatus::Unbounded,
                "objective can be improved without bound",
            )
            .with_statistics(statistics)),
            Err(other) => Err(SolverError::ExecutionFailed(format!("{other:?}"))),
        }
    }

    fn name(&self) -> &str {
        "COIN-OR CBC"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
