use std::collections::BTreeMap;

use crate::domain::expr::Comparison;
use crate::domain::model::LpModel;
use crate::domain::solver::{Solution, SolveError, Solver};
use crate::domain::validate::{validate_model, ModelError};
use crate::models::SolverDirection;

use microlp::{ComparisonOp, OptimizationDirection, Problem};

/// Pure-Rust simplex backend
pub struct MicrolpSolver;

impl MicrolpSolver {
    pub fn new() -> Self {
        MicrolpSolver
    }

    fn convert_error(&self, error: microlp::Error) -> SolveError {
        match error {
            microlp::Error::Infeasible => SolveError::Infeasible,
            microlp::Error::Unbounded => SolveError::Unbounded,
            other => SolveError::Backend {
                solver: self.name().to_string(),
                details: other.to_string(),
            },
        }
    }
}

impl Default for MicrolpSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver for MicrolpSolver {
    fn solve(&self, model: &LpModel) -> Result<Solution, SolveError> {
        validate_model(model)?;

        let direction = match model.direction {
            SolverDirection::Maximize => OptimizationDirection::Maximize,
            SolverDirection::Minimize => OptimizationDirection::Minimize,
        };
        let mut problem = Problem::new(direction);

        // Objective coefficients are attached per column
        let columns: Vec<microlp::Variable> = model
            .variables
            .iter()
            .map(|v| problem.add_var(model.objective.coefficient(&v.id), (v.lower, v.upper)))
            .collect();

        let index = model.variable_index();
        for (row_idx, constraint) in model.constraints.iter().enumerate() {
            let mut row: Vec<(microlp::Variable, f64)> = Vec::with_capacity(constraint.expr.len());
            for (id, coeff) in constraint.expr.terms() {
                let col = index.get(id).ok_or_else(|| ModelError::UnknownConstraintVariable {
                    constraint: row_idx,
                    id: id.to_string(),
                })?;
                row.push((columns[*col], coeff));
            }

            let op = match constraint.comparison {
                Comparison::Le => ComparisonOp::Le,
                Comparison::Ge => ComparisonOp::Ge,
                Comparison::Eq => ComparisonOp::Eq,
            };
            problem.add_constraint(row.as_slice(), op, constraint.rhs);
        }

        let solved = problem.solve().map_err(|e| self.convert_error(e))?;

        let values: BTreeMap<String, f64> = model
            .variables
            .iter()
            .zip(columns.iter())
            .map(|(v, col)| (v.id.clone(), solved[*col]))
            .collect();

        Ok(Solution {
            objective: solved.objective(),
            values,
        })
    }

    fn name(&self) -> &str {
        "microlp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::expr::{Constraint, LinearExpr};
    use crate::domain::model::VariableDef;

    const TOL: f64 = 1e-6;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < TOL,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_two_variable_maximization() {
        // max 4x1 + 3x2 s.t. x1 + x2 <= 40, 2x1 + x2 <= 60
        let model = LpModel::maximize()
            .with_variable(VariableDef::non_negative("x1"))
            .with_variable(VariableDef::non_negative("x2"))
            .with_objective([("x1", 4.0), ("x2", 3.0)].into_iter().collect())
            .with_constraint(Constraint::le([("x1", 1.0), ("x2", 1.0)].into_iter().collect(), 40.0))
            .with_constraint(Constraint::le([("x1", 2.0), ("x2", 1.0)].into_iter().collect(), 60.0));

        let solution = MicrolpSolver::new().solve(&model).unwrap();

        assert_close(solution.objective, 140.0);
        assert_close(solution.value("x1"), 20.0);
        assert_close(solution.value("x2"), 20.0);
    }

    #[test]
    fn test_minimization_with_ge_and_eq_rows() {
        let model = LpModel::minimize()
            .with_variable(VariableDef::new("x", 0.0, 10.0))
            .with_variable(VariableDef::new("y", 0.0, 10.0))
            .with_objective([("x", 2.0), ("y", 1.0)].into_iter().collect())
            .with_constraint(Constraint::ge([("x", 1.0), ("y", 1.0)].into_iter().collect(), 4.0))
            .with_constraint(Constraint::eq(LinearExpr::term("x", 1.0), 1.0));

        let solution = MicrolpSolver::new().solve(&model).unwrap();

        assert_close(solution.value("x"), 1.0);
        assert_close(solution.value("y"), 3.0);
        assert_close(solution.objective, 5.0);
    }

    #[test]
    fn test_infeasible_model() {
        let model = LpModel::maximize()
            .with_variable(VariableDef::new("x", 0.0, 60.0))
            .with_objective(LinearExpr::term("x", 1.0))
            .with_constraint(Constraint::ge(LinearExpr::term("x", 1.0), 200.0));

        assert_eq!(
            MicrolpSolver::new().solve(&model),
            Err(SolveError::Infeasible)
        );
    }

    #[test]
    fn test_unbounded_model() {
        let model = LpModel::maximize()
            .with_variable(VariableDef::non_negative("x"))
            .with_objective(LinearExpr::term("x", 1.0))
            .with_constraint(Constraint::ge(LinearExpr::term("x", 1.0), 1.0));

        assert_eq!(
            MicrolpSolver::new().solve(&model),
            Err(SolveError::Unbounded)
        );
    }

    #[test]
    fn test_invalid_model_is_rejected_before_solving() {
        let model = LpModel::maximize()
            .with_variable(VariableDef::non_negative("x"))
            .with_objective(LinearExpr::term("y", 1.0));

        assert!(matches!(
            MicrolpSolver::new().solve(&model),
            Err(SolveError::InvalidModel(ModelError::UnknownObjectiveVariable(_)))
        ));
    }
}
