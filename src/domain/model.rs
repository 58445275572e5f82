use std::collections::HashMap;

use crate::domain::expr::{Constraint, LinearExpr};
use crate::models::SolverDirection;

/// A continuous decision variable with `lower <= x <= upper`.
///
/// `upper` may be `f64::INFINITY`.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDef {
    pub id: String,
    pub lower: f64,
    pub upper: f64,
}

impl VariableDef {
    pub fn new(id: impl Into<String>, lower: f64, upper: f64) -> Self {
        VariableDef {
            id: id.into(),
            lower,
            upper,
        }
    }

    /// `x >= 0` with no upper bound
    pub fn non_negative(id: impl Into<String>) -> Self {
        Self::new(id, 0.0, f64::INFINITY)
    }
}

/// A complete LP handed to a [`Solver`](crate::domain::solver::Solver):
/// variables with bounds, one objective with a direction, and constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct LpModel {
    pub variables: Vec<VariableDef>,
    pub objective: LinearExpr,
    pub direction: SolverDirection,
    pub constraints: Vec<Constraint>,
}

impl LpModel {
    pub fn new(direction: SolverDirection) -> Self {
        LpModel {
            variables: Vec::new(),
            objective: LinearExpr::new(),
            direction,
            constraints: Vec::new(),
        }
    }

    pub fn maximize() -> Self {
        Self::new(SolverDirection::Maximize)
    }

    pub fn minimize() -> Self {
        Self::new(SolverDirection::Minimize)
    }

    pub fn with_variable(mut self, variable: VariableDef) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn with_objective(mut self, objective: LinearExpr) -> Self {
        self.objective = objective;
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn add_variable(&mut self, variable: VariableDef) {
        self.variables.push(variable);
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Column position of each variable id.
    pub fn variable_index(&self) -> HashMap<&str, usize> {
        self.variables
            .iter()
            .enumerate()
            .map(|(idx, v)| (v.id.as_str(), idx))
            .collect()
    }
}
