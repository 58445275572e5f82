use std::collections::BTreeMap;
use crate::domain::expr::Comparison;
use crate::domain::model::LpModel;
use crate::domain::solver::{Solution, SolveError, Solver};
use crate::domain::validate::{validate_model, ModelError};
use crate::models::SolverDirection;

use grb::prelude::*;

/// Gurobi solver implementation
pub struct GurobiSolver;

impl GurobiSolver {
    pub fn new() -> Self {
        GurobiSolver
    }

    fn backend_error(&self, context: &str, e: impl std::fmt::Display) -> SolveError {
        SolveError::Backend {
            solver: self.name().to_string(),
            details: format!("{}: {}", context, e),
        }
    }

    /// Map a non-optimal Gurobi status onto a solve error
    fn convert_status(&self, status: grb::Status) -> SolveError {
        match status {
            grb::Status::Infeasible => SolveError::Infeasible,
            grb::Status::Unbounded => SolveError::Unbounded,
            other => self.backend_error("Optimization ended with status", format!("{:?}", other)),
        }
    }
}

impl Default for GurobiSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver for GurobiSolver {
    fn solve(&self, model: &LpModel) -> Result<Solution, SolveError> {
        validate_model(model)?;

        let sense = match model.direction {
            SolverDirection::Maximize => ModelSense::Maximize,
            SolverDirection::Minimize => ModelSense::Minimize,
        };

        let mut env = Env::new("")
            .map_err(|e| self.backend_error("Failed to create Gurobi environment", e))?;

        // Disable Gurobi console output; set to 1 for verbose logging
        env.set(param::OutputFlag, 0)
            .map_err(|e| self.backend_error("Failed to set Gurobi output flag", e))?;

        let mut gurobi_model = Model::with_env("allocation", &env)
            .map_err(|e| self.backend_error("Failed to create Gurobi model", e))?;

        let mut vars: Vec<Var> = Vec::with_capacity(model.variables.len());
        for var in &model.variables {
            let gurobi_var = add_ctsvar!(
                gurobi_model,
                name: &var.id,
                bounds: var.lower..var.upper
            )
            .map_err(|e| self.backend_error("Failed to add continuous variable", e))?;
            vars.push(gurobi_var);
        }

        gurobi_model
            .update()
            .map_err(|e| self.backend_error("Failed to update model after adding variables", e))?;

        let index = model.variable_index();
        for (row_idx, constraint) in model.constraints.iter().enumerate() {
            let mut expr = Expr::Constant(0.0);
            for (id, coeff) in constraint.expr.terms() {
                let col = index.get(id).ok_or_else(|| ModelError::UnknownConstraintVariable {
                    constraint: row_idx,
                    id: id.to_string(),
                })?;
                expr = expr + coeff * vars[*col];
            }

            let rhs = constraint.rhs;
            let constraint_name = constraint
                .name
                .clone()
                .unwrap_or_else(|| format!("c{}", row_idx));
            let added = match constraint.comparison {
                Comparison::Le => gurobi_model.add_constr(&constraint_name, c!(expr <= rhs)),
                Comparison::Ge => gurobi_model.add_constr(&constraint_name, c!(expr >= rhs)),
                Comparison::Eq => gurobi_model.add_constr(&constraint_name, c!(expr == rhs)),
            };
            added.map_err(|e| self.backend_error("Failed to add constraint", e))?;
        }

        let obj_expr = model.variables.iter().enumerate().fold(
            Expr::Constant(0.0),
            |acc, (idx, var)| {
                let coeff = model.objective.coefficient(&var.id);
                if coeff != 0.0 {
                    acc + coeff * vars[idx]
                } else {
                    acc
                }
            },
        );

        gurobi_model
            .set_objective(obj_expr, sense)
            .map_err(|e| self.backend_error("Failed to set objective", e))?;

        gurobi_model
            .optimize()
            .map_err(|e| self.backend_error("Failed to optimize", e))?;

        let mut status = gurobi_model
            .status()
            .map_err(|e| self.backend_error("Failed to get model status", e))?;

        // Presolve may stop at InfOrUnbd; without dual reductions the
        // re-solve settles on one of the two
        if status == grb::Status::InfOrUnbd {
            gurobi_model
                .set_param(param::DualReductions, 0)
                .map_err(|e| self.backend_error("Failed to disable dual reductions", e))?;
            gurobi_model
                .optimize()
                .map_err(|e| self.backend_error("Failed to re-optimize", e))?;
            status = gurobi_model
                .status()
                .map_err(|e| self.backend_error("Failed to get model status", e))?;
        }

        if status != grb::Status::Optimal {
            return Err(self.convert_status(status));
        }

        let mut values: BTreeMap<String, f64> = BTreeMap::new();
        for (idx, var) in model.variables.iter().enumerate() {
            let value = gurobi_model
                .get_obj_attr(attr::X, &vars[idx])
                .map_err(|e| self.backend_error("Failed to read variable value", e))?;
            values.insert(var.id.clone(), value);
        }

        let objective = gurobi_model
            .get_attr(attr::ObjVal)
            .map_err(|e| self.backend_error("Failed to read objective value", e))?;

        Ok(Solution { objective, values })
    }

    fn name(&self) -> &str {
        "Gurobi"
    }
}
