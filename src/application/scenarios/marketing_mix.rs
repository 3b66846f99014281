//! Marketing budget split: allocate a fixed budget across acquisition
//! channels to maximize converted clients. Cost-per-lead and conversion
//! rate are constants per channel, so "clients per dollar" is just a
//! coefficient and the model stays linear.

use std::fmt;

use indexmap::IndexMap;

use super::ScenarioError;
use crate::application::report::{currency, ScenarioResult};
use crate::domain::expression::Expression;
use crate::domain::model::{Constraint, Model, VariableId, VariableSpec};
use crate::domain::solver_service::{SolveOptions, SolverAdapter};
use crate::domain::value_objects::OptimizationType;

#[derive(Debug, Clone, Copy)]
pub struct Channel {
    pub name: &'static str,
    pub cost_per_lead: f64,
    pub conversion_rate: f64,
}

/// Acquisition channels and their efficiency assumptions.
pub const CHANNELS: [Channel; 4] = [
    Channel { name: "Digital", cost_per_lead: 50.0, conversion_rate: 0.15 },
    Channel { name: "TV", cost_per_lead: 200.0, conversion_rate: 0.08 },
    Channel { name: "Radio", cost_per_lead: 75.0, conversion_rate: 0.10 },
    Channel { name: "Print", cost_per_lead: 100.0, conversion_rate: 0.05 },
];

#[derive(Debug, Clone)]
pub struct MarketingMixParams {
    pub total_budget: f64,
    pub min_per_channel: f64,
    /// Maximum fraction of the total spend any channel may take.
    pub max_channel_share: f64,
}

impl Default for MarketingMixParams {
    fn default() -> Self {
        Self {
            total_budget: 500_000.0,
            min_per_channel: 20_000.0,
            max_channel_share: 0.4,
        }
    }
}

#[derive(Debug)]
pub struct ChannelPlan {
    pub budget: f64,
    pub leads: f64,
    pub new_clients: f64,
}

#[derive(Debug)]
pub struct MarketingMixReport {
    pub channels: IndexMap<String, ChannelPlan>,
    pub total_new_clients: f64,
}

/// Builds the budget-split model: one continuous spend per channel.
pub fn build(
    params: &MarketingMixParams,
) -> Result<(Model, IndexMap<&'static str, VariableId>), ScenarioError> {
    let mut model = Model::new("marketing-mix");
    let budget = model.add_variables(
        "budget",
        CHANNELS.iter().map(|c| c.name),
        VariableSpec::continuous(),
    )?;

    let new_clients = Expression::sum(CHANNELS.iter().map(|channel| {
        (channel.conversion_rate / channel.cost_per_lead) * budget[channel.name]
    }));
    model.set_objective(OptimizationType::Maximize, new_clients)?;

    let total = Expression::sum(budget.values().map(|&b| Expression::from(b)));
    model.add_constraint(
        Constraint::less_or_equal(total.clone(), Expression::constant(params.total_budget))
            .with_name("total_budget"),
    )?;
    for channel in &CHANNELS {
        let b = budget[channel.name];
        model.add_constraint(
            Constraint::greater_or_equal(1.0 * b, Expression::constant(params.min_per_channel))
                .with_name(format!("min_spend_{}", channel.name)),
        )?;
        model.add_constraint(
            Constraint::less_or_equal(1.0 * b, total.clone().scale(params.max_channel_share))
                .with_name(format!("max_share_{}", channel.name)),
        )?;
    }

    Ok((model, budget))
}

pub fn run(
    solver: &dyn SolverAdapter,
    options: &SolveOptions,
) -> Result<ScenarioResult<MarketingMixReport>, ScenarioError> {
    run_with(&MarketingMixParams::default(), solver, options)
}

pub fn run_with(
    params: &MarketingMixParams,
    solver: &dyn SolverAdapter,
    options: &SolveOptions,
) -> Result<ScenarioResult<MarketingMixReport>, ScenarioError> {
    let (mut model, budget) = build(params)?;
    let solution = model.solve(solver, options)?;
    let Some(total_new_clients) = solution.objective_value() else {
        return Ok(ScenarioResult::Unsolved {
            status: solution.status(),
            message: solution.message().to_string(),
        });
    };

    let mut channels = IndexMap::new();
    for channel in &CHANNELS {
        let spend = solution.value(budget[channel.name]).unwrap_or(0.0);
        let leads = spend / channel.cost_per_lead;
        channels.insert(
            channel.name.to_string(),
            ChannelPlan {
                budget: spend,
                leads,
                new_clients: leads * channel.conversion_rate,
            },
        );
    }

    Ok(ScenarioResult::Optimal(MarketingMixReport {
        channels,
        total_new_clients,
    }))
}

impl fmt::Display for MarketingMixReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, plan) in &self.channels {
            writeln!(f, "channel {name}:")?;
            writeln!(f, "  budget: {}", currency(plan.budget))?;
            writeln!(f, "  leads generated: {:.0}", plan.leads)?;
            writeln!(f, "  new clients: {:.0}", plan.new_clients)?;
        }
        write!(f, "total new clients: {:.0}", self.total_new_clients)
    }
}
