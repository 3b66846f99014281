// Scenario builders: six independent allocation decisions, each a short
// composition of the same modeling vocabulary. Pick an index set, build
// variables and linear constraints, solve, read the result back into
// domain terms. None of them contains solving logic of its own.

pub mod age_allocation;
pub mod capacity_planning;
pub mod client_selection;
pub mod marketing_mix;
pub mod regional_portfolio;
pub mod service_network;

use crate::domain::model::ModelError;
use crate::domain::records::DataError;
use crate::domain::solver_service::SolveError;

/// Anything that can stop a single scenario. Scenarios own independent
/// models, so one failing scenario never affects the others.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Solve(#[from] SolveError),
}
