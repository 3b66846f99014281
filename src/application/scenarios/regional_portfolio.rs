//! Regional portfolio balancing: decide how many clients to take from
//! each BMI-derived region so that expected cost is minimized while the
//! portfolio stays large enough and no region dominates it. The share
//! cap is the linear ratio form `y_r ≤ share · Σ y`, never a division.

use std::fmt;

use indexmap::IndexMap;

use super::ScenarioError;
use crate::application::report::{currency, ScenarioResult};
use crate::domain::expression::Expression;
use crate::domain::model::{Constraint, Model, VariableId, VariableSpec};
use crate::domain::records::{AttrValue, DataError, RecordStore, Reducer};
use crate::domain::solver_service::{SolveOptions, SolverAdapter};
use crate::domain::value_objects::OptimizationType;

/// Derived attribute assigning each client a region from their BMI.
pub const BMI_REGION: &str = "bmi_region";

#[derive(Debug, Clone)]
pub struct RegionalPortfolioParams {
    pub min_total_clients: f64,
    /// Maximum fraction of the portfolio any single region may hold.
    pub max_region_share: f64,
    pub min_per_region: f64,
}

impl Default for RegionalPortfolioParams {
    fn default() -> Self {
        Self {
            min_total_clients: 50.0,
            max_region_share: 0.3,
            min_per_region: 10.0,
        }
    }
}

#[derive(Debug)]
pub struct RegionalPortfolioReport {
    pub clients_per_region: IndexMap<String, i64>,
    pub total_cost: f64,
}

/// Attaches the BMI-derived region attribute (no-op if already present).
pub fn derive_regions(store: &mut RecordStore) -> Result<(), DataError> {
    store.derive(BMI_REGION, |record| {
        let bmi = record.number("bmi")?;
        let region = if bmi < 25.0 {
            "North"
        } else if bmi < 30.0 {
            "South"
        } else {
            "Central"
        };
        Ok(AttrValue::from(region))
    })
}

/// Builds the portfolio model: one integer head count per region, with
/// expected cost per client taken from the regional mean of charges.
pub fn build(
    store: &RecordStore,
    params: &RegionalPortfolioParams,
) -> Result<(Model, IndexMap<String, VariableId>), ScenarioError> {
    let groups = store.group_by(BMI_REGION)?;
    let mean_cost = RecordStore::aggregate(&groups, "charges", Reducer::Mean)?;

    let mut model = Model::new("regional-portfolio");
    let clients = model.add_variables(
        "clients",
        mean_cost.keys().cloned(),
        VariableSpec::integer(),
    )?;

    let objective = Expression::sum(
        clients
            .iter()
            .map(|(region, &y)| mean_cost[region] * y),
    );
    model.set_objective(OptimizationType::Minimize, objective)?;

    let total = Expression::sum(clients.values().map(|&y| Expression::from(y)));
    model.add_constraint(
        Constraint::greater_or_equal(total.clone(), Expression::constant(params.min_total_clients))
            .with_name("min_total"),
    )?;
    for (region, &y) in &clients {
        model.add_constraint(
            Constraint::less_or_equal(1.0 * y, total.clone().scale(params.max_region_share))
                .with_name(format!("max_share_{region}")),
        )?;
        model.add_constraint(
            Constraint::greater_or_equal(1.0 * y, Expression::constant(params.min_per_region))
                .with_name(format!("min_clients_{region}")),
        )?;
    }

    Ok((model, clients))
}

pub fn run(
    store: &mut RecordStore,
    solver: &dyn SolverAdapter,
    options: &SolveOptions,
) -> Result<ScenarioResult<RegionalPortfolioReport>, ScenarioError> {
    run_with(store, &RegionalPortfolioParams::default(), solver, options)
}

pub fn run_with(
    store: &mut RecordStore,
    params: &RegionalPortfolioParams,
    solver: &dyn SolverAdapter,
    options: &SolveOptions,
) -> Result<ScenarioResult<RegionalPortfolioReport>, ScenarioError> {
    derive_regions(store)?;
    let (mut model, clients) = build(store, params)?;
    let solution = model.solve(solver, options)?;
    let Some(total_cost) = solution.objective_value() else {
        return Ok(ScenarioResult::Unsolved {
            status: solution.status(),
            message: solution.message().to_string(),
        });
    };

    let clients_per_region = clients
        .iter()
        .map(|(region, &y)| {
            let count = solution.value(y).unwrap_or(0.0).round() as i64;
            (region.clone(), count)
        })
        .collect();

    Ok(ScenarioResult::Optimal(RegionalPortfolioReport {
        clients_per_region,
        total_cost,
    }))
}

impl fmt::Display for RegionalPortfolioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (region, count) in &self.clients_per_region {
            writeln!(f, "clients from region {region}: {count}")?;
        }
        write!(f, "estimated total cost: {}", currency(self.total_cost))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::records::Record;
    use indexmap::IndexMap as AttrMap;

    fn store_with_bmi(rows: &[(f64, f64)]) -> RecordStore {
        RecordStore::new(
            rows.iter()
                .enumerate()
                .map(|(id, &(bmi, charges))| {
                    let mut attrs = AttrMap::new();
                    attrs.insert("bmi".to_string(), AttrValue::Number(bmi));
                    attrs.insert("charges".to_string(), AttrValue::Number(charges));
                    Record::new(id, attrs)
                })
                .collect(),
        )
    }

    #[test]
    fn regions_follow_bmi_thresholds() {
        let mut store = store_with_bmi(&[(22.0, 100.0), (27.0, 200.0), (33.0, 300.0)]);
        derive_regions(&mut store).unwrap();
        let labels: Vec<&str> = store
            .records()
            .iter()
            .map(|r| r.text(BMI_REGION).unwrap())
            .collect();
        assert_eq!(labels, ["North", "South", "Central"]);
    }

    #[test]
    fn one_integer_variable_and_three_constraints_per_region() {
        let mut store = store_with_bmi(&[(22.0, 100.0), (27.0, 200.0), (33.0, 300.0)]);
        derive_regions(&mut store).unwrap();
        let (model, clients) = build(&store, &RegionalPortfolioParams::default()).unwrap();

        assert_eq!(clients.len(), 3);
        // one min-total plus a share cap and a floor per region
        assert_eq!(model.num_constraints(), 1 + 2 * 3);
        let names: Vec<&str> = model.variables().iter().map(|v| v.name()).collect();
        assert_eq!(names, ["clients_North", "clients_South", "clients_Central"]);
    }
}
