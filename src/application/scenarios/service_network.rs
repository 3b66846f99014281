//! Service-network design: choose which candidate service centers to
//! open and assign every client to exactly one open center, minimizing
//! travel distance plus fixed opening costs.
//!
//! The open/assign linkage is the pure binary form `w_ij ≤ z_j`; no
//! big-M constant is needed because both sides are binary.

use std::fmt;

use indexmap::IndexMap;

use super::ScenarioError;
use crate::application::report::{currency, ScenarioResult};
use crate::domain::expression::Expression;
use crate::domain::model::{Constraint, Model, VariableId, VariableSpec};
use crate::domain::solver_service::{SolveOptions, SolverAdapter};
use crate::domain::value_objects::OptimizationType;

/// A client location or candidate center site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone)]
pub struct ServiceNetworkParams {
    /// Fixed cost of opening one center.
    pub center_fixed_cost: f64,
    pub min_open_centers: usize,
    pub max_open_centers: usize,
}

impl Default for ServiceNetworkParams {
    fn default() -> Self {
        Self {
            center_fixed_cost: 10_000.0,
            min_open_centers: 2,
            max_open_centers: 4,
        }
    }
}

/// Decision variables of the network model.
pub struct NetworkVariables {
    /// `open[j]`: center j is opened.
    pub open: Vec<VariableId>,
    /// `assign[i][j]`: client i is served by center j.
    pub assign: Vec<Vec<VariableId>>,
}

#[derive(Debug)]
pub struct ServiceNetworkReport {
    pub open_centers: Vec<usize>,
    /// Number of clients served by each open center.
    pub clients_per_center: IndexMap<usize, usize>,
    pub total_distance: f64,
    pub total_cost: f64,
}

/// Builds the location-allocation model over the given coordinates.
pub fn build(
    clients: &[Point],
    centers: &[Point],
    params: &ServiceNetworkParams,
) -> Result<(Model, NetworkVariables), ScenarioError> {
    let mut model = Model::new("service-network");

    let open: Vec<VariableId> = model
        .add_variables("open", 0..centers.len(), VariableSpec::binary())?
        .into_values()
        .collect();

    let mut assign = Vec::with_capacity(clients.len());
    let mut objective = Expression::sum(
        open.iter()
            .map(|&z| params.center_fixed_cost * z),
    );
    for (i, client) in clients.iter().enumerate() {
        let mut row = Vec::with_capacity(centers.len());
        for (j, center) in centers.iter().enumerate() {
            let w = model.add_variable(format!("assign_{i}_{j}"), VariableSpec::binary())?;
            objective += client.distance(*center) * w;
            row.push(w);
        }
        assign.push(row);
    }
    model.set_objective(OptimizationType::Minimize, objective)?;

    for (i, row) in assign.iter().enumerate() {
        let served = Expression::sum(row.iter().map(|&w| Expression::from(w)));
        model.add_constraint(
            Constraint::equal(served, Expression::constant(1.0))
                .with_name(format!("serve_client_{i}")),
        )?;
        for (j, &w) in row.iter().enumerate() {
            model.add_constraint(
                Constraint::less_or_equal(1.0 * w, 1.0 * open[j])
                    .with_name(format!("open_link_{i}_{j}")),
            )?;
        }
    }

    let open_count = Expression::sum(open.iter().map(|&z| Expression::from(z)));
    model.add_constraint(
        Constraint::greater_or_equal(
            open_count.clone(),
            Expression::constant(params.min_open_centers as f64),
        )
        .with_name("min_open"),
    )?;
    model.add_constraint(
        Constraint::less_or_equal(
            open_count,
            Expression::constant(params.max_open_centers as f64),
        )
        .with_name("max_open"),
    )?;

    Ok((model, NetworkVariables { open, assign }))
}

pub fn run(
    clients: &[Point],
    centers: &[Point],
    solver: &dyn SolverAdapter,
    options: &SolveOptions,
) -> Result<ScenarioResult<ServiceNetworkReport>, ScenarioError> {
    run_with(clients, centers, &ServiceNetworkParams::default(), solver, options)
}

pub fn run_with(
    clients: &[Point],
    centers: &[Point],
    params: &ServiceNetworkParams,
    solver: &dyn SolverAdapter,
    options: &SolveOptions,
) -> Result<ScenarioResult<ServiceNetworkReport>, ScenarioError> {
    let (mut model, variables) = build(clients, centers, params)?;
    let solution = model.solve(solver, options)?;
    let Some(total_cost) = solution.objective_value() else {
        return Ok(ScenarioResult::Unsolved {
            status: solution.status(),
            message: solution.message().to_string(),
        });
    };

    let open_centers: Vec<usize> = variables
        .open
        .iter()
        .enumerate()
        .filter(|&(_, &z)| solution.value(z).is_some_and(|v| v > 0.5))
        .map(|(j, _)| j)
        .collect();

    let mut clients_per_center: IndexMap<usize, usize> =
        open_centers.iter().map(|&j| (j, 0)).collect();
    let mut total_distance = 0.0;
    for (i, row) in variables.assign.iter().enumerate() {
        for (j, &w) in row.iter().enumerate() {
            if solution.value(w).is_some_and(|v| v > 0.5) {
                total_distance += clients[i].distance(centers[j]);
                if let Some(count) = clients_per_center.get_mut(&j) {
                    *count += 1;
                }
            }
        }
    }

    Ok(ScenarioResult::Optimal(ServiceNetworkReport {
        open_centers,
        clients_per_center,
        total_distance,
        total_cost,
    }))
}

impl fmt::Display for ServiceNetworkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "open service centers: {:?}", self.open_centers)?;
        for (center, count) in &self.clients_per_center {
            writeln!(f, "center {center} serves {count} clients")?;
        }
        writeln!(f, "total distance: {:.2}", self.total_distance)?;
        write!(f, "total cost: {}", currency(self.total_cost))
    }
}
