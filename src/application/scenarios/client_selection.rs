//! Client selection: choose which clients to accept so that total revenue
//! is maximized while the *average* cost of the accepted clients stays
//! under a cap. The average is kept linear by writing it as
//! `Σ cost_i·x_i ≤ cap · Σ x_i` over binary acceptance variables.

use std::fmt;

use indexmap::IndexMap;

use super::ScenarioError;
use crate::application::report::{currency, ScenarioResult};
use crate::domain::expression::Expression;
use crate::domain::model::{Constraint, Model, VariableId, VariableSpec};
use crate::domain::records::{Record, RecordStore};
use crate::domain::solver_service::{SolveOptions, SolverAdapter};
use crate::domain::value_objects::OptimizationType;

#[derive(Debug, Clone)]
pub struct ClientSelectionParams {
    /// Flat revenue assumed per accepted client.
    pub revenue_per_client: f64,
    /// Cap on the mean cost of the accepted clients.
    pub mean_cost_cap: f64,
}

impl Default for ClientSelectionParams {
    fn default() -> Self {
        Self {
            revenue_per_client: 5000.0,
            mean_cost_cap: 15000.0,
        }
    }
}

#[derive(Debug)]
pub struct ClientSelectionReport {
    /// Record ids of the accepted clients.
    pub accepted: Vec<usize>,
    pub total_revenue: f64,
    /// Mean cost of the accepted clients; `None` if nobody was accepted.
    pub mean_cost: Option<f64>,
}

/// Builds the selection model: one binary acceptance variable per record.
pub fn build(
    store: &RecordStore,
    params: &ClientSelectionParams,
) -> Result<(Model, IndexMap<usize, VariableId>), ScenarioError> {
    let mut model = Model::new("client-selection");
    let accept = model.add_variables(
        "accept",
        store.records().iter().map(Record::id),
        VariableSpec::binary(),
    )?;

    let mut revenue = Expression::constant(0.0);
    let mut total_cost = Expression::constant(0.0);
    let mut head_count = Expression::constant(0.0);
    for record in store.records() {
        let x = accept[&record.id()];
        revenue += params.revenue_per_client * x;
        total_cost += record.number("charges")? * x;
        head_count += Expression::from(x);
    }

    model.set_objective(OptimizationType::Maximize, revenue)?;
    model.add_constraint(
        Constraint::less_or_equal(total_cost, head_count.scale(params.mean_cost_cap))
            .with_name("mean_cost_cap"),
    )?;

    Ok((model, accept))
}

pub fn run(
    store: &RecordStore,
    solver: &dyn SolverAdapter,
    options: &SolveOptions,
) -> Result<ScenarioResult<ClientSelectionReport>, ScenarioError> {
    run_with(store, &ClientSelectionParams::default(), solver, options)
}

pub fn run_with(
    store: &RecordStore,
    params: &ClientSelectionParams,
    solver: &dyn SolverAdapter,
    options: &SolveOptions,
) -> Result<ScenarioResult<ClientSelectionReport>, ScenarioError> {
    let (mut model, accept) = build(store, params)?;
    let solution = model.solve(solver, options)?;
    let Some(total_revenue) = solution.objective_value() else {
        return Ok(ScenarioResult::Unsolved {
            status: solution.status(),
            message: solution.message().to_string(),
        });
    };

    let mut accepted = Vec::new();
    let mut cost_sum = 0.0;
    for record in store.records() {
        let x = accept[&record.id()];
        if solution.value(x).is_some_and(|v| v > 0.5) {
            accepted.push(record.id());
            cost_sum += record.number("charges")?;
        }
    }
    let mean_cost = (!accepted.is_empty()).then(|| cost_sum / accepted.len() as f64);

    Ok(ScenarioResult::Optimal(ClientSelectionReport {
        accepted,
        total_revenue,
        mean_cost,
    }))
}

impl fmt::Display for ClientSelectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "clients accepted: {}", self.accepted.len())?;
        writeln!(f, "total revenue: {}", currency(self.total_revenue))?;
        match self.mean_cost {
            Some(mean) => write!(f, "mean cost of accepted clients: {}", currency(mean)),
            None => write!(f, "mean cost of accepted clients: n/a"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::records::AttrValue;
    use indexmap::IndexMap as AttrMap;

    fn store_with_charges(charges: &[f64]) -> RecordStore {
        RecordStore::new(
            charges
                .iter()
                .enumerate()
                .map(|(id, &c)| {
                    let mut attrs = AttrMap::new();
                    attrs.insert("charges".to_string(), AttrValue::Number(c));
                    Record::new(id, attrs)
                })
                .collect(),
        )
    }

    #[test]
    fn builds_one_binary_variable_per_record() {
        let store = store_with_charges(&[100.0, 200.0, 300.0]);
        let (model, accept) = build(&store, &ClientSelectionParams::default()).unwrap();

        assert_eq!(accept.len(), 3);
        assert_eq!(model.num_variables(), 3);
        assert_eq!(model.num_constraints(), 1);

        let names: Vec<&str> = model.variables().iter().map(|v| v.name()).collect();
        assert_eq!(names, ["accept_0", "accept_1", "accept_2"]);
    }

    #[test]
    fn rebuilding_yields_identical_structure() {
        let store = store_with_charges(&[100.0, 200.0]);
        let params = ClientSelectionParams::default();
        let (a, _) = build(&store, &params).unwrap();
        let (b, _) = build(&store, &params).unwrap();

        let names = |m: &Model| -> Vec<String> {
            m.variables().iter().map(|v| v.name().to_string()).collect()
        };
        assert_eq!(names(&a), names(&b));
        assert_eq!(a.num_constraints(), b.num_constraints());
        assert_eq!(a.constraints()[0].bound(), b.constraints()[0].bound());
    }
}
