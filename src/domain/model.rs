// Optimization model: variable registry, constraints, objective, solve
// orchestration.
//
// A model owns every variable it hands out. Handles from one model are
// rejected by any other model, which keeps constraint aliasing bugs from
// producing a well-formed but meaningless solve.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use super::expression::Expression;
use super::solver_service::{Solution, SolveError, SolveOptions, SolverAdapter};
use super::value_objects::{ConstraintType, OptimizationType, VariableType};

static NEXT_MODEL_ID: AtomicU64 = AtomicU64::new(1);

/// Errors raised while constructing or solving a model. All of these are
/// programming-contract violations: they fail fast and are never
/// downgraded to a solver status.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("invalid bounds for variable '{name}': {detail}")]
    InvalidBounds { name: String, detail: String },

    #[error("duplicate variable '{0}'")]
    DuplicateVariable(String),

    #[error("variable {variable} does not belong to model '{model}'")]
    ForeignVariable { variable: VariableId, model: String },

    #[error("model '{0}' has no objective")]
    NoObjective(String),

    #[error("model '{0}' was modified after being solved; build a fresh model instead")]
    ModelAlreadySolved(String),
}

/// Lightweight handle to a decision variable. Carries the owning model's
/// id so misuse across models is detectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId {
    model: u64,
    column: usize,
}

impl VariableId {
    /// Zero-based column index of the variable within its model. Solver
    /// adapters use this to line handles up with solver columns.
    pub fn column(self) -> usize {
        self.column
    }

    pub(crate) fn model_id(self) -> u64 {
        self.model
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} (model {})", self.column, self.model)
    }
}

/// Domain kind and bounds requested for a new variable.
#[derive(Debug, Clone, Copy)]
pub struct VariableSpec {
    variable_type: VariableType,
    lower_bound: f64,
    upper_bound: Option<f64>,
}

impl VariableSpec {
    pub fn continuous() -> Self {
        Self {
            variable_type: VariableType::Continuous,
            lower_bound: 0.0,
            upper_bound: None,
        }
    }

    pub fn integer() -> Self {
        Self {
            variable_type: VariableType::Integer,
            lower_bound: 0.0,
            upper_bound: None,
        }
    }

    pub fn binary() -> Self {
        Self {
            variable_type: VariableType::Binary,
            lower_bound: 0.0,
            upper_bound: Some(1.0),
        }
    }

    pub fn with_bounds(mut self, lower: f64, upper: Option<f64>) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }
}

/// A registered decision variable.
#[derive(Debug, Clone)]
pub struct Variable {
    name: String,
    variable_type: VariableType,
    lower_bound: f64,
    upper_bound: Option<f64>,
}

impl Variable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variable_type(&self) -> VariableType {
        self.variable_type
    }

    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> Option<f64> {
        self.upper_bound
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.variable_type,
            VariableType::Integer | VariableType::Binary
        )
    }
}

/// A linear constraint, normalized at construction to
/// `Σ coefficient · variable ⋈ bound` (all constants folded into the
/// bound). Never mutated after being added to a model.
#[derive(Debug, Clone)]
pub struct Constraint {
    name: Option<String>,
    lhs: Expression,
    constraint_type: ConstraintType,
    bound: f64,
}

impl Constraint {
    pub fn new(
        lhs: impl Into<Expression>,
        constraint_type: ConstraintType,
        rhs: impl Into<Expression>,
    ) -> Self {
        let lhs: Expression = lhs.into();
        let rhs: Expression = rhs.into();
        let (constant, lhs) = (lhs - rhs).split_constant();
        Self {
            name: None,
            lhs,
            constraint_type,
            bound: -constant,
        }
    }

    pub fn less_or_equal(lhs: impl Into<Expression>, rhs: impl Into<Expression>) -> Self {
        Self::new(lhs, ConstraintType::LessThanOrEqual, rhs)
    }

    pub fn equal(lhs: impl Into<Expression>, rhs: impl Into<Expression>) -> Self {
        Self::new(lhs, ConstraintType::Equal, rhs)
    }

    pub fn greater_or_equal(lhs: impl Into<Expression>, rhs: impl Into<Expression>) -> Self {
        Self::new(lhs, ConstraintType::GreaterThanOrEqual, rhs)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// `(variable, coefficient)` pairs of the normalized left-hand side.
    pub fn terms(&self) -> impl Iterator<Item = (VariableId, f64)> + '_ {
        self.lhs.terms()
    }

    pub fn constraint_type(&self) -> ConstraintType {
        self.constraint_type
    }

    pub fn bound(&self) -> f64 {
        self.bound
    }

    fn variables(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.lhs.variables()
    }
}

/// Objective function: one expression and a direction.
#[derive(Debug, Clone)]
pub struct Objective {
    optimization_type: OptimizationType,
    expression: Expression,
}

impl Objective {
    pub fn optimization_type(&self) -> OptimizationType {
        self.optimization_type
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }
}

/// A complete optimization model: owned variables, ordered constraints,
/// and one objective. Populated by a scenario builder, solved once.
#[derive(Debug)]
pub struct Model {
    id: u64,
    name: String,
    variables: Vec<Variable>,
    columns_by_name: HashMap<String, usize>,
    constraints: Vec<Constraint>,
    objective: Option<Objective>,
    solved: bool,
    modified_after_solve: bool,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            variables: Vec::new(),
            columns_by_name: HashMap::new(),
            constraints: Vec::new(),
            objective: None,
            solved: false,
            modified_after_solve: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers one decision variable and returns its handle.
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        spec: VariableSpec,
    ) -> Result<VariableId, ModelError> {
        let name = name.into();
        Self::validate_bounds(&name, &spec)?;
        if self.columns_by_name.contains_key(&name) {
            return Err(ModelError::DuplicateVariable(name));
        }
        if self.solved {
            self.modified_after_solve = true;
        }

        let column = self.variables.len();
        self.columns_by_name.insert(name.clone(), column);
        self.variables.push(Variable {
            name,
            variable_type: spec.variable_type,
            lower_bound: spec.lower_bound,
            upper_bound: spec.upper_bound,
        });
        Ok(VariableId {
            model: self.id,
            column,
        })
    }

    /// Registers one variable per index value, named `{prefix}_{index}`.
    /// Names are derived deterministically, so rebuilding the same model
    /// yields the same names in the same order.
    pub fn add_variables<K>(
        &mut self,
        prefix: &str,
        indices: impl IntoIterator<Item = K>,
        spec: VariableSpec,
    ) -> Result<IndexMap<K, VariableId>, ModelError>
    where
        K: fmt::Display + Hash + Eq,
    {
        let mut handles = IndexMap::new();
        for index in indices {
            let variable = self.add_variable(format!("{prefix}_{index}"), spec)?;
            handles.insert(index, variable);
        }
        Ok(handles)
    }

    /// Sets the objective, replacing any previous one. Fails fast if the
    /// expression references a variable owned by another model.
    pub fn set_objective(
        &mut self,
        optimization_type: OptimizationType,
        expression: Expression,
    ) -> Result<(), ModelError> {
        self.check_owned(expression.variables())?;
        if self.solved {
            self.modified_after_solve = true;
        }
        self.objective = Some(Objective {
            optimization_type,
            expression,
        });
        Ok(())
    }

    /// Appends a constraint. Fails fast on foreign variables.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), ModelError> {
        self.check_owned(constraint.variables())?;
        if self.solved {
            self.modified_after_solve = true;
        }
        self.constraints.push(constraint);
        Ok(())
    }

    /// Delegates to the solver adapter and passes its result through
    /// unchanged. Requires an objective, and rejects a re-solve of a
    /// model that was mutated after its first solve.
    pub fn solve(
        &mut self,
        solver: &dyn SolverAdapter,
        options: &SolveOptions,
    ) -> Result<Solution, SolveError> {
        if self.solved && self.modified_after_solve {
            return Err(ModelError::ModelAlreadySolved(self.name.clone()).into());
        }
        if self.objective.is_none() {
            return Err(ModelError::NoObjective(self.name.clone()).into());
        }

        tracing::debug!(
            model = %self.name,
            solver = solver.name(),
            variables = self.num_variables(),
            constraints = self.num_constraints(),
            "solving model"
        );
        let solution = solver.solve(self, options)?;
        tracing::debug!(model = %self.name, status = %solution.status(), "solve finished");

        self.solved = true;
        Ok(solution)
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// The registered definition behind a handle, if it belongs here.
    pub fn variable(&self, id: VariableId) -> Option<&Variable> {
        if id.model != self.id {
            return None;
        }
        self.variables.get(id.column)
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    /// Whether `id` was created by this model.
    pub fn owns(&self, id: VariableId) -> bool {
        id.model == self.id && id.column < self.variables.len()
    }

    pub(crate) fn model_id(&self) -> u64 {
        self.id
    }

    fn check_owned(&self, variables: impl Iterator<Item = VariableId>) -> Result<(), ModelError> {
        for variable in variables {
            if !self.owns(variable) {
                return Err(ModelError::ForeignVariable {
                    variable,
                    model: self.name.clone(),
                });
            }
        }
        Ok(())
    }

    fn validate_bounds(name: &str, spec: &VariableSpec) -> Result<(), ModelError> {
        if spec.variable_type == VariableType::Binary {
            if spec.lower_bound != 0.0 || spec.upper_bound != Some(1.0) {
                return Err(ModelError::InvalidBounds {
                    name: name.to_string(),
                    detail: "binary variables must have bounds [0, 1]".to_string(),
                });
            }
            return Ok(());
        }
        if let Some(upper) = spec.upper_bound {
            if spec.lower_bound > upper {
                return Err(ModelError::InvalidBounds {
                    name: name.to_string(),
                    detail: format!("lower bound {} exceeds upper bound {upper}", spec.lower_bound),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::solver_service::{Solution, SolverError};

    /// Adapter double that reports every variable at its lower bound.
    struct StubSolver;

    impl SolverAdapter for StubSolver {
        fn solve(&self, model: &Model, _options: &SolveOptions) -> Result<Solution, SolverError> {
            let values = model.variables().iter().map(|v| v.lower_bound()).collect();
            Ok(Solution::optimal(model, 0.0, values))
        }

        fn name(&self) -> &str {
            "stub"
        }

        fn supports_mip(&self) -> bool {
            true
        }
    }

    #[test]
    fn binary_with_custom_bounds_is_rejected() {
        let mut model = Model::new("m");
        let err = model
            .add_variable("b", VariableSpec::binary().with_bounds(0.0, Some(2.0)))
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidBounds { .. }));
    }

    #[test]
    fn crossed_bounds_are_rejected() {
        let mut model = Model::new("m");
        let err = model
            .add_variable("x", VariableSpec::continuous().with_bounds(5.0, Some(1.0)))
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidBounds { .. }));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut model = Model::new("m");
        model.add_variable("x", VariableSpec::continuous()).unwrap();
        let err = model
            .add_variable("x", VariableSpec::integer())
            .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateVariable(name) if name == "x"));
    }

    #[test]
    fn indexed_variables_get_distinct_deterministic_names() {
        let mut model = Model::new("m");
        let handles = model
            .add_variables("x", 0..4, VariableSpec::binary())
            .unwrap();
        assert_eq!(handles.len(), 4);

        let names: Vec<&str> = model.variables().iter().map(Variable::name).collect();
        assert_eq!(names, ["x_0", "x_1", "x_2", "x_3"]);
    }

    #[test]
    fn foreign_variable_is_rejected() {
        let mut owner = Model::new("owner");
        let mut other = Model::new("other");
        let x = owner.add_variable("x", VariableSpec::continuous()).unwrap();

        let err = other
            .add_constraint(Constraint::less_or_equal(1.0 * x, Expression::constant(3.0)))
            .unwrap_err();
        assert!(matches!(err, ModelError::ForeignVariable { .. }));

        let err = other
            .set_objective(OptimizationType::Maximize, 1.0 * x)
            .unwrap_err();
        assert!(matches!(err, ModelError::ForeignVariable { .. }));
    }

    #[test]
    fn solve_without_objective_fails() {
        let mut model = Model::new("m");
        model.add_variable("x", VariableSpec::continuous()).unwrap();
        let err = model.solve(&StubSolver, &SolveOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            SolveError::Model(ModelError::NoObjective(_))
        ));
    }

    #[test]
    fn resolve_after_mutation_fails() {
        let mut model = Model::new("m");
        let x = model.add_variable("x", VariableSpec::continuous()).unwrap();
        model
            .set_objective(OptimizationType::Minimize, 1.0 * x)
            .unwrap();
        model.solve(&StubSolver, &SolveOptions::default()).unwrap();

        model
            .add_constraint(Constraint::greater_or_equal(1.0 * x, Expression::constant(1.0)))
            .unwrap();
        let err = model.solve(&StubSolver, &SolveOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            SolveError::Model(ModelError::ModelAlreadySolved(_))
        ));
    }

    #[test]
    fn resolve_without_mutation_is_allowed() {
        let mut model = Model::new("m");
        let x = model.add_variable("x", VariableSpec::continuous()).unwrap();
        model
            .set_objective(OptimizationType::Minimize, 1.0 * x)
            .unwrap();
        model.solve(&StubSolver, &SolveOptions::default()).unwrap();
        assert!(model.solve(&StubSolver, &SolveOptions::default()).is_ok());
    }

    #[test]
    fn constraints_normalize_constants_into_the_bound() {
        let mut model = Model::new("m");
        let x = model.add_variable("x", VariableSpec::continuous()).unwrap();
        let y = model.add_variable("y", VariableSpec::continuous()).unwrap();

        // 2x + 3 <= y + 10  normalizes to  2x - y <= 7
        let c = Constraint::less_or_equal(
            2.0 * x + Expression::constant(3.0),
            1.0 * y + Expression::constant(10.0),
        );
        assert_eq!(c.bound(), 7.0);
        let terms: Vec<(VariableId, f64)> = c.terms().collect();
        assert_eq!(terms, vec![(x, 2.0), (y, -1.0)]);
        model.add_constraint(c).unwrap();
    }
}
