use std::collections::HashSet;

use thiserror::Error;

use crate::domain::expr::LinearExpr;
use crate::domain::model::{LpModel, VariableDef};

/// Malformed input, detected before any solver is invoked.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("At least one variable is required")]
    NoVariables,

    #[error("At least one objective is required")]
    NoObjectives,

    #[error("Variable {0} is declared more than once")]
    DuplicateVariable(String),

    #[error("Variable {id} has invalid bounds ({lower}, {upper})")]
    InvalidBound { id: String, lower: f64, upper: f64 },

    #[error("Objective contains missing variable {0}")]
    UnknownObjectiveVariable(String),

    #[error("Constraint {constraint} contains missing variable {id}")]
    UnknownConstraintVariable { constraint: usize, id: String },

    #[error("Coefficient on {id} must be finite")]
    NonFiniteCoefficient { id: String },

    #[error("Constraint {0} has no terms")]
    EmptyConstraint(usize),

    #[error("Constraint {0} has a non-finite right-hand side")]
    NonFiniteRhs(usize),

    #[error("At least one period is required")]
    NoPeriods,

    #[error("At least one sample per period is required")]
    NoSamples,

    #[error("Period {period} has invalid distribution (mean {mean}, std {std})")]
    InvalidDistribution { period: u32, mean: f64, std: f64 },

    #[error("Total capacity must be finite and non-negative, got {0}")]
    InvalidCapacity(f64),

    #[error("Period {period} has invalid cap {cap}")]
    InvalidPeriodCap { period: u32, cap: f64 },

    #[error("No cap given for period {0}")]
    MissingPeriodCap(u32),

    #[error("Period {0} is not in the distribution table")]
    UnknownPeriod(u32),

    #[error("Sample rows must all hold the same number of draws")]
    RaggedSamples,

    #[error("{periods} periods x {samples} samples exceeds the limit of {limit} sample cells")]
    TooManySamples {
        periods: usize,
        samples: usize,
        limit: usize,
    },

    #[error("Exactly one of period_cap and period_caps must be given")]
    AmbiguousPeriodCap,
}

/// Checks that `model` is well formed: unique ids, ordered finite-lower
/// bounds, and objective/constraint terms over declared variables only.
pub fn validate_model(model: &LpModel) -> Result<(), ModelError> {
    let variable_ids = validate_variables(&model.variables)?;

    validate_objective(&variable_ids, &model.objective)?;

    for (idx, constraint) in model.constraints.iter().enumerate() {
        if constraint.expr.is_empty() {
            return Err(ModelError::EmptyConstraint(idx));
        }
        if !constraint.rhs.is_finite() {
            return Err(ModelError::NonFiniteRhs(idx));
        }
        for (id, coeff) in constraint.expr.terms() {
            if !variable_ids.contains(id) {
                return Err(ModelError::UnknownConstraintVariable {
                    constraint: idx,
                    id: id.to_string(),
                });
            }
            if !coeff.is_finite() {
                return Err(ModelError::NonFiniteCoefficient { id: id.to_string() });
            }
        }
    }

    Ok(())
}

fn validate_variables(variables: &[VariableDef]) -> Result<HashSet<&str>, ModelError> {
    if variables.is_empty() {
        return Err(ModelError::NoVariables);
    }

    let mut ids = HashSet::with_capacity(variables.len());
    for v in variables {
        if !ids.insert(v.id.as_str()) {
            return Err(ModelError::DuplicateVariable(v.id.clone()));
        }
        // upper may be +inf, lower may not
        if !v.lower.is_finite() || v.upper.is_nan() || v.lower > v.upper {
            return Err(ModelError::InvalidBound {
                id: v.id.clone(),
                lower: v.lower,
                upper: v.upper,
            });
        }
    }

    Ok(ids)
}

pub fn validate_objective(
    variable_ids: &HashSet<&str>,
    objective: &LinearExpr,
) -> Result<(), ModelError> {
    for (objective_variable, coeff) in objective.terms() {
        if !variable_ids.contains(objective_variable) {
            return Err(ModelError::UnknownObjectiveVariable(
                objective_variable.to_string(),
            ));
        }
        if !coeff.is_finite() {
            return Err(ModelError::NonFiniteCoefficient {
                id: objective_variable.to_string(),
            });
        }
    }

    Ok(())
}
