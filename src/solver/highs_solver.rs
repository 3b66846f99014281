// HiGHS solver adapter.
// Translates the domain model to the HiGHS column/row API and maps the
// solver verdict back onto the domain solution statuses.

use std::time::Instant;

use crate::domain::{
    model::Model,
    solver_service::{Solution, SolveOptions, SolverAdapter, SolverError, SolverStatistics},
    value_objects::{ConstraintType, OptimizationType, SolutionStatus},
};

pub struct HighsSolver;

impl HighsSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HighsSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverAdapter for HighsSolver {
    fn solve(&self, model: &Model, options: &SolveOptions) -> Result<Solution, SolverError> {
        use highs::{HighsModelStatus, RowProblem, Sense};

        let objective = model
            .objective()
            .ok_or_else(|| SolverError::ExecutionFailed("model has no objective".to_string()))?;

        let start_time = Instant::now();

        // Objective coefficients are attached per column in HiGHS.
        let mut objective_coeffs = vec![0.0; model.num_variables()];
        for (var, coeff) in objective.expression().terms() {
            objective_coeffs[var.column()] = coeff;
        }

        let mut problem = RowProblem::default();
        let mut columns = Vec::with_capacity(model.num_variables());
        for (i, def) in model.variables().iter().enumerate() {
            let lower = def.lower_bound();
            let upper = def.upper_bound().unwrap_or(f64::INFINITY);
            let col = if def.is_integer() {
                problem.add_integer_column(objective_coeffs[i], lower..upper)
            } else {
                problem.add_column(objective_coeffs[i], lower..upper)
            };
            columns.push(col);
        }

        for constraint in model.constraints() {
            let factors: Vec<(highs::Col, f64)> = constraint
                .terms()
                .map(|(var, coeff)| (columns[var.column()], coeff))
                .collect();
            let bound = constraint.bound();
            match constraint.constraint_type() {
                ConstraintType::LessThanOrEqual => problem.add_row(..=bound, &factors),
                ConstraintType::Equal => problem.add_row(bound..=bound, &factors),
                ConstraintType::GreaterThanOrEqual => problem.add_row(bound.., &factors),
            };
        }

        let sense = match objective.optimization_type() {
            OptimizationType::Maximize => Sense::Maximise,
            OptimizationType::Minimize => Sense::Minimise,
        };

        let mut highs_model = problem.optimise(sense);
        if !options.verbose {
            highs_model.make_quiet();
        }
        if let Some(limit) = options.time_limit {
            highs_model.set_option("time_limit", limit.as_secs_f64());
        }
        if let Some(gap) = options.gap_tolerance {
            highs_model.set_option("mip_rel_gap", gap);
        }

        let solved = highs_model.solve();
        let solve_time = start_time.elapsed().as_secs_f64() * 1000.0;
        let statistics = SolverStatistics::for_model(model, solve_time);
        tracing::debug!(
            model = model.name(),
            status = ?solved.status(),
            solve_time_ms = solve_time,
            "HiGHS solve finished"
        );

        match solved.status() {
            HighsModelStatus::Optimal => {
                let values = solved.get_solution().columns().to_vec();

                // Recompute the objective from the assignment so the
                // reported value includes any constant term.
                let mut objective_value = objective.expression().constant_term();
                for (var, coeff) in objective.expression().terms() {
                    objective_value += coeff * values[var.column()];
                }

                Ok(Solution::optimal(model, objective_value, values).with_statistics(statistics))
            }
            HighsModelStatus::Infeasible => Ok(Solution::without_assignment(
                model,
                SolutionStatus::Infeasible,
                "no assignment satisfies all constraints",
            )
            .with_statistics(statistics)),
            HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => {
                Ok(Solution::without_assignment(
                    model,
                    SolutionStatus::Unbounded,
                    "objective can be improved without bound",
                )
                .with_statistics(statistics))
            }
            HighsModelStatus::ReachedTimeLimit => Ok(Solution::without_assignment(
                model,
                SolutionStatus::NotSolved,
                "time budget expired before a verdict was reached",
            )
            .with_statistics(statistics)),
            status => Err(SolverError::ExecutionFailed(format!(
                "HiGHS solver returned status: {status:?}"
            ))),
        }
    }

    fn name(&self) -> &str {
        "HiGHS"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
