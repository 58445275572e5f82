//! Construction of the sampled expected-value objective.
//!
//! For an objective linear in `x`, the sample average of per-scenario
//! revenues equals revenue at the per-period sample means:
//!
//! ```text
//! (1/S) Σ_s Σ_t p[t][s] x[t] = Σ_t μ[t] x[t],   μ[t] = (1/S) Σ_s p[t][s]
//! ```
//!
//! [`mean_objective`] builds the right-hand side in O(T·S) once;
//! [`expanded_objective`] builds the left-hand side scenario by scenario.

use serde::{Deserialize, Serialize};

use crate::domain::expr::LinearExpr;
use crate::domain::sampling::SampleMatrix;

/// Id of the decision variable for `period`
pub fn period_variable(period: u32) -> String {
    format!("x[{}]", period)
}

/// Σ_t coefficient[t] · x[t]
pub fn weighted_sum<I>(coefficients: I) -> LinearExpr
where
    I: IntoIterator<Item = (u32, f64)>,
{
    coefficients
        .into_iter()
        .map(|(period, coeff)| (period_variable(period), coeff))
        .collect()
}

/// Σ_t x[t] over `periods`
pub fn total<I>(periods: I) -> LinearExpr
where
    I: IntoIterator<Item = u32>,
{
    weighted_sum(periods.into_iter().map(|period| (period, 1.0)))
}

/// Σ_t μ[t] · x[t]
pub fn mean_objective(samples: &SampleMatrix) -> LinearExpr {
    weighted_sum(samples.means())
}

/// (1/S) · Σ_s Σ_t sample[t][s] · x[t]
pub fn expanded_objective(samples: &SampleMatrix) -> LinearExpr {
    let scenario_count = samples.sample_count();
    let total_revenue: LinearExpr = (0..scenario_count)
        .map(|s| weighted_sum(samples.rows().map(|(period, row)| (period, row[s]))))
        .sum();
    total_revenue.scale(1.0 / scenario_count as f64)
}

/// Which of the two equivalent objective forms to hand the solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formulation {
    #[default]
    MeanPrecomputed,
    Expanded,
}

impl Formulation {
    pub fn build(self, samples: &SampleMatrix) -> LinearExpr {
        match self {
            Formulation::MeanPrecomputed => mean_objective(samples),
            Formulation::Expanded => expanded_objective(samples),
        }
    }
}
