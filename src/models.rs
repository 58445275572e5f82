use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::expr::Comparison;
use crate::domain::objective::Formulation;
use crate::domain::sampling::PriceDistribution;
use crate::report::BoxStats;

// ---------- API (wire) types: owned & serde-friendly ----------

/// Variable bounds `(lower, upper)`; a `null` upper bound means unbounded
pub type Bound = (f64, Option<f64>);

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApiVariable {
    pub id: String,
    pub bound: Bound,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApiConstraint {
    pub coefficients: BTreeMap<String, f64>,
    pub comparison: Comparison,
    pub rhs: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApiLinearProgram {
    pub variables: Vec<ApiVariable>,
    #[serde(default)]
    pub constraints: Vec<ApiConstraint>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SolverDirection {
    Maximize,
    Minimize,
}

pub type ObjectiveOwned = BTreeMap<String, f64>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SolveRequest {
    pub program: ApiLinearProgram,
    pub objectives: Vec<ObjectiveOwned>,
    pub direction: SolverDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver: Option<String>,
}

// ---------- API response types ----------

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Optimal,
    Infeasible,
    Unbounded,
    SolverFailed,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApiSolution {
    pub status: Status,
    pub objective: Option<f64>,
    pub solution: BTreeMap<String, f64>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SolveResponse {
    pub solutions: Vec<ApiSolution>,
}

// ---------- Stochastic allocation ----------

/// `Σ_t coefficients[t] · x[t] <cmp> rhs`, keyed by period
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApiPeriodConstraint {
    pub coefficients: BTreeMap<u32, f64>,
    pub comparison: Comparison,
    pub rhs: f64,
}

/// Exactly one of `period_cap` (same cap everywhere) and `period_caps`
/// (per-period caps) must be given.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StochasticRequest {
    pub total_capacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_cap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_caps: Option<BTreeMap<u32, f64>>,
    pub distributions: BTreeMap<u32, PriceDistribution>,
    pub num_samples: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub constraints: Vec<ApiPeriodConstraint>,
    #[serde(default)]
    pub formulation: Formulation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApiPeriod {
    pub period: u32,
    pub mean_price: f64,
    pub allocation: Option<f64>,
    pub stats: Option<BoxStats>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StochasticResponse {
    pub status: Status,
    pub solver: String,
    pub objective: Option<f64>,
    pub periods: Vec<ApiPeriod>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_solve_request_accepts_null_upper_bound() {
        let req: SolveRequest = serde_json::from_value(json!({
            "program": {
                "variables": [{"id": "x1", "bound": [0, null]}, {"id": "x2", "bound": [0, 5]}]
            },
            "objectives": [{"x1": 4, "x2": 3}],
            "direction": "maximize"
        }))
        .unwrap();

        assert_eq!(req.program.variables[0].bound, (0.0, None));
        assert_eq!(req.program.variables[1].bound, (0.0, Some(5.0)));
        assert!(req.program.constraints.is_empty());
        assert_eq!(req.solver, None);
    }

    #[test]
    fn test_stochastic_request_defaults() {
        let req: StochasticRequest = serde_json::from_value(json!({
            "total_capacity": 100,
            "period_cap": 60,
            "distributions": {"1": {"mean": 50, "std": 0}, "2": {"mean": 30, "std": 0}},
            "num_samples": 5
        }))
        .unwrap();

        assert_eq!(req.distributions.len(), 2);
        assert_eq!(req.distributions[&1], PriceDistribution::new(50.0, 0.0));
        assert_eq!(req.formulation, Formulation::MeanPrecomputed);
        assert!(req.constraints.is_empty());
        assert_eq!(req.seed, None);
        assert_eq!(req.period_caps, None);
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&Status::SolverFailed).unwrap(),
            "\"solver_failed\""
        );
    }
}
