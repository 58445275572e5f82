use std::collections::BTreeMap;

use thiserror::Error;

use crate::domain::model::LpModel;
use crate::domain::validate::ModelError;

/// Optimal assignment returned by a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub objective: f64,
    pub values: BTreeMap<String, f64>,
}

impl Solution {
    /// Value of `id`, zero for unknown variables.
    pub fn value(&self, id: &str) -> f64 {
        self.values.get(id).copied().unwrap_or(0.0)
    }
}

/// Terminal outcome of a solve that did not produce an optimum.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("invalid model: {0}")]
    InvalidModel(#[from] ModelError),

    #[error("problem is infeasible")]
    Infeasible,

    #[error("problem is unbounded")]
    Unbounded,

    /// The backend itself failed; `details` is its raw diagnostic.
    #[error("{solver} failed: {details}")]
    Backend { solver: String, details: String },
}

/// Common interface for LP solvers
pub trait Solver: Send + Sync {
    /// Solve a single linear program
    ///
    /// # Arguments
    /// * `model` - Variables with bounds, the objective with its direction,
    ///   and the linear constraints
    ///
    /// # Returns
    /// The optimal objective value and one value per declared variable, or
    /// the reason no optimum exists
    fn solve(&self, model: &LpModel) -> Result<Solution, SolveError>;

    /// Get the solver name for logging/debugging
    fn name(&self) -> &str;
}
