use std::collections::BTreeMap;
use crate::domain::expr::Comparison;
use crate::domain::model::LpModel;
use crate::domain::solver::{Solution, SolveError, Solver};
use crate::domain::validate::{validate_model, ModelError};
use crate::models::SolverDirection;

use ::highs::{ColProblem, HighsModelStatus, Row, Sense};

/// HiGHS solver implementation
pub struct HighsSolver;

impl HighsSolver {
    pub fn new() -> Self {
        HighsSolver
    }

    /// Map a non-optimal HiGHS status onto a solve error
    fn convert_status(&self, model_status: HighsModelStatus) -> SolveError {
        match model_status {
            HighsModelStatus::Infeasible => SolveError::Infeasible,
            HighsModelStatus::Unbounded => SolveError::Unbounded,
            other => SolveError::Backend {
                solver: self.name().to_string(),
                details: format!("model status {:?}", other),
            },
        }
    }
}

impl Default for HighsSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver for HighsSolver {
    fn solve(&self, model: &LpModel) -> Result<Solution, SolveError> {
        validate_model(model)?;

        let sense = match model.direction {
            SolverDirection::Maximize => Sense::Maximise,
            SolverDirection::Minimize => Sense::Minimise,
        };

        let mut problem = ColProblem::new();

        // First, add all constraint rows
        let mut rows: Vec<Row> = Vec::with_capacity(model.constraints.len());
        for constraint in &model.constraints {
            let rhs = constraint.rhs;
            let row = match constraint.comparison {
                Comparison::Le => problem.add_row(..=rhs),
                Comparison::Ge => problem.add_row(rhs..),
                Comparison::Eq => problem.add_row(rhs..=rhs),
            };
            rows.push(row);
        }

        // Build column data: for each variable, collect its row entries
        let index = model.variable_index();
        let mut col_data: Vec<Vec<(Row, f64)>> = vec![Vec::new(); model.variables.len()];
        for (row_idx, constraint) in model.constraints.iter().enumerate() {
            for (id, coeff) in constraint.expr.terms() {
                let col = index.get(id).ok_or_else(|| ModelError::UnknownConstraintVariable {
                    constraint: row_idx,
                    id: id.to_string(),
                })?;
                col_data[*col].push((rows[row_idx], coeff));
            }
        }

        for (var, row_factors) in model.variables.iter().zip(col_data.iter()) {
            problem.add_column(
                model.objective.coefficient(&var.id),
                var.lower..=var.upper,
                row_factors,
            );
        }

        // Presolve off so infeasibility is reported as such, not as UnboundedOrInfeasible
        let mut highs_model = problem.optimise(sense);
        highs_model.set_option("presolve", "off");
        let solved = highs_model.solve();

        let model_status = solved.status();
        if !matches!(model_status, HighsModelStatus::Optimal) {
            return Err(self.convert_status(model_status));
        }

        let solution_values = solved.get_solution();
        let values: BTreeMap<String, f64> = model
            .variables
            .iter()
            .enumerate()
            .map(|(col_idx, var)| {
                let value = solution_values.columns().get(col_idx).copied().unwrap_or(0.0);
                (var.id.clone(), value)
            })
            .collect();

        Ok(Solution {
            objective: model.objective.evaluate(&values),
            values,
        })
    }

    fn name(&self) -> &str {
        "HiGHS"
    }
}
