// Scenario result vocabulary shared by the six builders.

use std::fmt;

use crate::domain::value_objects::SolutionStatus;

/// Outcome of running a scenario: either its typed report, or the solver
/// status explaining why there is nothing to report. An infeasible
/// scenario is a legitimate answer and renders as such, never as an
/// error or garbage numbers.
#[derive(Debug)]
pub enum ScenarioResult<T> {
    Optimal(T),
    Unsolved {
        status: SolutionStatus,
        message: String,
    },
}

impl<T> ScenarioResult<T> {
    pub fn is_optimal(&self) -> bool {
        matches!(self, ScenarioResult::Optimal(_))
    }

    pub fn optimal(self) -> Option<T> {
        match self {
            ScenarioResult::Optimal(report) => Some(report),
            ScenarioResult::Unsolved { .. } => None,
        }
    }

    pub fn as_optimal(&self) -> Option<&T> {
        match self {
            ScenarioResult::Optimal(report) => Some(report),
            ScenarioResult::Unsolved { .. } => None,
        }
    }

    pub fn status(&self) -> SolutionStatus {
        match self {
            ScenarioResult::Optimal(_) => SolutionStatus::Optimal,
            ScenarioResult::Unsolved { status, .. } => *status,
        }
    }
}

impl<T: fmt::Display> fmt::Display for ScenarioResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioResult::Optimal(report) => report.fmt(f),
            ScenarioResult::Unsolved { status, message } => {
                write!(f, "no solution ({status}): {message}")
            }
        }
    }
}

/// Formats a currency amount with thousands separators, e.g. `$12,345.67`.
pub fn currency(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let whole: String = grouped.chars().rev().collect();
    format!("{sign}${whole}.{cents}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(currency(0.0), "$0.00");
        assert_eq!(currency(999.5), "$999.50");
        assert_eq!(currency(15000.0), "$15,000.00");
        assert_eq!(currency(1234567.891), "$1,234,567.89");
        assert_eq!(currency(-2500.0), "-$2,500.00");
    }
}
