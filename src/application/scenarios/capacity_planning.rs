//! Hospital capacity planning: size three service lines so that every
//! unit of projected demand is covered at minimum cost, within a fixed
//! budget. Demand is projected per client from age, smoking status, and
//! BMI, then summed into one requirement per service.

use std::fmt;

use indexmap::IndexMap;

use super::ScenarioError;
use crate::application::report::{currency, ScenarioResult};
use crate::domain::expression::Expression;
use crate::domain::model::{Constraint, Model, VariableId, VariableSpec};
use crate::domain::records::{AttrValue, DataError, RecordStore};
use crate::domain::solver_service::{SolveOptions, SolverAdapter};
use crate::domain::value_objects::OptimizationType;

/// Service lines and their cost per unit of capacity.
pub const SERVICES: [(&str, f64); 3] = [
    ("emergency", 10000.0),
    ("surgery", 15000.0),
    ("consultation", 2000.0),
];

#[derive(Debug, Clone)]
pub struct CapacityPlanningParams {
    /// Upper limit on total capacity cost.
    pub budget: f64,
}

impl Default for CapacityPlanningParams {
    fn default() -> Self {
        Self { budget: 2_000_000.0 }
    }
}

#[derive(Debug)]
pub struct CapacityPlanningReport {
    /// Recommended capacity units per service.
    pub capacity: IndexMap<String, i64>,
    pub total_cost: f64,
}

/// Projects per-client demand flags for each service line.
pub fn derive_demand(store: &mut RecordStore) -> Result<(), DataError> {
    let flag = |on: bool| AttrValue::Number(if on { 1.0 } else { 0.0 });
    store.derive("demand_emergency", move |r| {
        Ok(flag(r.number("age")? > 50.0 || r.text("smoker")? == "yes"))
    })?;
    store.derive("demand_surgery", move |r| {
        Ok(flag(r.number("bmi")? > 35.0 || r.number("age")? > 60.0))
    })?;
    store.derive("demand_consultation", move |_| Ok(AttrValue::Number(1.0)))
}

/// Builds the sizing model: one integer capacity variable per service.
pub fn build(
    store: &RecordStore,
    params: &CapacityPlanningParams,
) -> Result<(Model, IndexMap<String, VariableId>), ScenarioError> {
    let mut model = Model::new("capacity-planning");

    let mut capacity = IndexMap::new();
    let mut total_cost = Expression::constant(0.0);
    for (service, unit_cost) in SERVICES {
        let cap = model.add_variable(format!("cap_{service}"), VariableSpec::integer())?;
        capacity.insert(service.to_string(), cap);
        total_cost += unit_cost * cap;

        let demand = store.sum(&format!("demand_{service}"))?;
        model.add_constraint(
            Constraint::greater_or_equal(1.0 * cap, Expression::constant(demand))
                .with_name(format!("cover_{service}")),
        )?;
    }

    model.set_objective(OptimizationType::Minimize, total_cost.clone())?;
    model.add_constraint(
        Constraint::less_or_equal(total_cost, Expression::constant(params.budget))
            .with_name("budget"),
    )?;

    Ok((model, capacity))
}

pub fn run(
    store: &mut RecordStore,
    solver: &dyn SolverAdapter,
    options: &SolveOptions,
) -> Result<ScenarioResult<CapacityPlanningReport>, ScenarioError> {
    run_with(store, &CapacityPlanningParams::default(), solver, options)
}

pub fn run_with(
    store: &mut RecordStore,
    params: &CapacityPlanningParams,
    solver: &dyn SolverAdapter,
    options: &SolveOptions,
) -> Result<ScenarioResult<CapacityPlanningReport>, ScenarioError> {
    derive_demand(store)?;
    let (mut model, capacity) = build(store, params)?;
    let solution = model.solve(solver, options)?;
    let Some(total_cost) = solution.objective_value() else {
        return Ok(ScenarioResult::Unsolved {
            status: solution.status(),
            message: solution.message().to_string(),
        });
    };

    let capacity = capacity
        .iter()
        .map(|(service, &cap)| {
            let units = solution.value(cap).unwrap_or(0.0).round() as i64;
            (service.clone(), units)
        })
        .collect();

    Ok(ScenarioResult::Optimal(CapacityPlanningReport {
        capacity,
        total_cost,
    }))
}

impl fmt::Display for CapacityPlanningReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "recommended capacity:")?;
        for (service, units) in &self.capacity {
            writeln!(f, "  {service}: {units} units")?;
        }
        write!(f, "total capacity cost: {}", currency(self.total_cost))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::records::Record;
    use indexmap::IndexMap as AttrMap;

    fn client(id: usize, age: f64, smoker: &str, bmi: f64) -> Record {
        let mut attrs = AttrMap::new();
        attrs.insert("age".to_string(), AttrValue::Number(age));
        attrs.insert("smoker".to_string(), AttrValue::from(smoker));
        attrs.insert("bmi".to_string(), AttrValue::Number(bmi));
        Record::new(id, attrs)
    }

    #[test]
    fn demand_flags_follow_the_projection_rules() {
        let mut store = RecordStore::new(vec![
            client(0, 55.0, "no", 22.0),  // emergency by age
            client(1, 30.0, "yes", 40.0), // emergency by smoking, surgery by bmi
            client(2, 25.0, "no", 24.0),  // consultation only
        ]);
        derive_demand(&mut store).unwrap();

        assert_eq!(store.sum("demand_emergency").unwrap(), 2.0);
        assert_eq!(store.sum("demand_surgery").unwrap(), 1.0);
        assert_eq!(store.sum("demand_consultation").unwrap(), 3.0);
    }

    #[test]
    fn builds_one_capacity_variable_per_service() {
        let mut store = RecordStore::new(vec![client(0, 55.0, "no", 22.0)]);
        derive_demand(&mut store).unwrap();
        let (model, capacity) = build(&store, &CapacityPlanningParams::default()).unwrap();

        assert_eq!(capacity.len(), 3);
        // one coverage constraint per service plus the budget
        assert_eq!(model.num_constraints(), 4);
    }
}
