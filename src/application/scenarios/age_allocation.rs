//! Age-tier allocation: decide how many clients to accept per age tier
//! to maximize profit (tier revenue minus the tier's mean cost), while
//! keeping a minimum portfolio size and a minimum share per tier.
//!
//! The minimum-size and minimum-share constraints can be jointly
//! infeasible on some datasets; that outcome is reported as data, not
//! treated as a failure.

use std::fmt;

use indexmap::IndexMap;

use super::ScenarioError;
use crate::application::report::{currency, ScenarioResult};
use crate::domain::expression::Expression;
use crate::domain::model::{Constraint, Model, VariableId, VariableSpec};
use crate::domain::records::{AttrValue, DataError, RecordStore, Reducer};
use crate::domain::solver_service::{SolveOptions, SolverAdapter};
use crate::domain::value_objects::OptimizationType;

/// Derived attribute holding each client's age tier.
pub const AGE_TIER: &str = "age_tier";

/// Tiers as right-closed age cuts, with the assumed revenue per client.
const TIERS: [(&str, f64, f64); 3] = [
    ("Young", 30.0, 4000.0),
    ("Adult", 50.0, 5000.0),
    ("Senior", f64::INFINITY, 6000.0),
];

#[derive(Debug, Clone)]
pub struct AgeAllocationParams {
    pub min_total_clients: f64,
    /// Minimum fraction of the portfolio each tier must hold.
    pub min_tier_share: f64,
}

impl Default for AgeAllocationParams {
    fn default() -> Self {
        Self {
            min_total_clients: 100.0,
            min_tier_share: 0.2,
        }
    }
}

#[derive(Debug)]
pub struct TierAllocation {
    pub accepted: i64,
    pub unit_revenue: f64,
    pub unit_cost: f64,
    pub unit_profit: f64,
}

#[derive(Debug)]
pub struct AgeAllocationReport {
    pub tiers: IndexMap<String, TierAllocation>,
    pub total_profit: f64,
}

/// Attaches the age-tier attribute (no-op if already present).
pub fn derive_tiers(store: &mut RecordStore) -> Result<(), DataError> {
    store.derive(AGE_TIER, |record| {
        let age = record.number("age")?;
        let tier = TIERS
            .iter()
            .find(|&&(_, max_age, _)| age <= max_age)
            .map(|&(name, _, _)| name)
            .unwrap_or("Senior");
        Ok(AttrValue::from(tier))
    })
}

/// Builds the allocation model: one integer head count per tier present
/// in the data, capped by that tier's availability.
pub fn build(
    store: &RecordStore,
    params: &AgeAllocationParams,
) -> Result<(Model, IndexMap<String, VariableId>), ScenarioError> {
    let groups = store.group_by(AGE_TIER)?;
    let available = RecordStore::aggregate(&groups, "charges", Reducer::Count)?;
    let mean_cost = RecordStore::aggregate(&groups, "charges", Reducer::Mean)?;

    let mut model = Model::new("age-allocation");
    let mut accepted = IndexMap::new();
    let mut profit = Expression::constant(0.0);
    for (tier, _, unit_revenue) in TIERS {
        let (Some(&avail), Some(&cost)) = (available.get(tier), mean_cost.get(tier)) else {
            continue;
        };
        let n = model.add_variable(format!("clients_{tier}"), VariableSpec::integer())?;
        accepted.insert(tier.to_string(), n);
        profit += (unit_revenue - cost) * n;

        model.add_constraint(
            Constraint::less_or_equal(1.0 * n, Expression::constant(avail))
                .with_name(format!("available_{tier}")),
        )?;
    }
    model.set_objective(OptimizationType::Maximize, profit)?;

    let total = Expression::sum(accepted.values().map(|&n| Expression::from(n)));
    model.add_constraint(
        Constraint::greater_or_equal(total.clone(), Expression::constant(params.min_total_clients))
            .with_name("min_total"),
    )?;
    for (tier, &n) in &accepted {
        model.add_constraint(
            Constraint::greater_or_equal(1.0 * n, total.clone().scale(params.min_tier_share))
                .with_name(format!("min_share_{tier}")),
        )?;
    }

    Ok((model, accepted))
}

pub fn run(
    store: &mut RecordStore,
    solver: &dyn SolverAdapter,
    options: &SolveOptions,
) -> Result<ScenarioResult<AgeAllocationReport>, ScenarioError> {
    run_with(store, &AgeAllocationParams::default(), solver, options)
}

pub fn run_with(
    store: &mut RecordStore,
    params: &AgeAllocationParams,
    solver: &dyn SolverAdapter,
    options: &SolveOptions,
) -> Result<ScenarioResult<AgeAllocationReport>, ScenarioError> {
    derive_tiers(store)?;
    let groups = store.group_by(AGE_TIER)?;
    let mean_cost = RecordStore::aggregate(&groups, "charges", Reducer::Mean)?;

    let (mut model, accepted) = build(store, params)?;
    let solution = model.solve(solver, options)?;
    let Some(total_profit) = solution.objective_value() else {
        return Ok(ScenarioResult::Unsolved {
            status: solution.status(),
            message: solution.message().to_string(),
        });
    };

    let mut tiers = IndexMap::new();
    for (tier, &n) in &accepted {
        let unit_revenue = TIERS
            .iter()
            .find(|&&(name, _, _)| name == tier.as_str())
            .map(|&(_, _, revenue)| revenue)
            .unwrap_or(0.0);
        let unit_cost = mean_cost[tier];
        tiers.insert(
            tier.clone(),
            TierAllocation {
                accepted: solution.value(n).unwrap_or(0.0).round() as i64,
                unit_revenue,
                unit_cost,
                unit_profit: unit_revenue - unit_cost,
            },
        );
    }

    Ok(ScenarioResult::Optimal(AgeAllocationReport {
        tiers,
        total_profit,
    }))
}

impl fmt::Display for AgeAllocationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (tier, allocation) in &self.tiers {
            writeln!(f, "tier {tier}:")?;
            writeln!(f, "  clients accepted: {}", allocation.accepted)?;
            writeln!(f, "  unit revenue: {}", currency(allocation.unit_revenue))?;
            writeln!(f, "  unit cost: {}", currency(allocation.unit_cost))?;
            writeln!(f, "  unit profit: {}", currency(allocation.unit_profit))?;
        }
        write!(f, "estimated total profit: {}", currency(self.total_profit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::records::Record;
    use indexmap::IndexMap as AttrMap;

    fn client(id: usize, age: f64, charges: f64) -> Record {
        let mut attrs = AttrMap::new();
        attrs.insert("age".to_string(), AttrValue::Number(age));
        attrs.insert("charges".to_string(), AttrValue::Number(charges));
        Record::new(id, attrs)
    }

    #[test]
    fn tier_cuts_are_right_closed() {
        let mut store = RecordStore::new(vec![
            client(0, 30.0, 100.0),
            client(1, 31.0, 100.0),
            client(2, 50.0, 100.0),
            client(3, 51.0, 100.0),
        ]);
        derive_tiers(&mut store).unwrap();
        let labels: Vec<&str> = store
            .records()
            .iter()
            .map(|r| r.text(AGE_TIER).unwrap())
            .collect();
        assert_eq!(labels, ["Young", "Adult", "Adult", "Senior"]);
    }

    #[test]
    fn absent_tiers_get_no_variable() {
        // nobody over 50: no Senior tier in the model
        let mut store = RecordStore::new(vec![client(0, 20.0, 100.0), client(1, 40.0, 100.0)]);
        derive_tiers(&mut store).unwrap();
        let (model, accepted) = build(&store, &AgeAllocationParams::default()).unwrap();

        assert_eq!(accepted.len(), 2);
        let names: Vec<&str> = model.variables().iter().map(|v| v.name()).collect();
        assert_eq!(names, ["clients_Young", "clients_Adult"]);
    }
}
