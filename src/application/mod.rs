// Application layer: the six scenario builders and their reports

pub mod report;
pub mod scenarios;

pub use report::{currency, ScenarioResult};
pub use scenarios::ScenarioError;
