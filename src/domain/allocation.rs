//! Expected-revenue allocation of a shared resource across periods.
//!
//! Decision `x[t]` is the quantity sold in period `t`, bounded by
//! `0 <= x[t] <= L(t)`, with `Σ_t x[t] <= Q`. The objective is the Monte
//! Carlo estimate of expected revenue built by
//! [`Formulation`](crate::domain::objective::Formulation).

use std::collections::BTreeMap;

use log::{debug, info, warn};

use crate::domain::expr::{Comparison, Constraint};
use crate::domain::model::{LpModel, VariableDef};
use crate::domain::objective::{period_variable, total, weighted_sum, Formulation};
use crate::domain::sampling::{PriceDistribution, SampleGenerator, SampleMatrix};
use crate::domain::solver::{SolveError, Solver};
use crate::domain::validate::ModelError;

pub const TOTAL_CAPACITY_CONSTRAINT: &str = "total_capacity";

/// Upper bound on each period's quantity
#[derive(Debug, Clone, PartialEq)]
pub enum PeriodCap {
    Uniform(f64),
    PerPeriod(BTreeMap<u32, f64>),
}

impl PeriodCap {
    pub fn cap_for(&self, period: u32) -> Option<f64> {
        match self {
            PeriodCap::Uniform(cap) => Some(*cap),
            PeriodCap::PerPeriod(caps) => caps.get(&period).copied(),
        }
    }
}

/// `Σ_t coefficients[t] · x[t] <cmp> rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodConstraint {
    pub coefficients: BTreeMap<u32, f64>,
    pub comparison: Comparison,
    pub rhs: f64,
}

impl PeriodConstraint {
    pub fn new(coefficients: BTreeMap<u32, f64>, comparison: Comparison, rhs: f64) -> Self {
        PeriodConstraint {
            coefficients,
            comparison,
            rhs,
        }
    }

    fn to_constraint(&self) -> Constraint {
        Constraint::new(
            weighted_sum(self.coefficients.iter().map(|(p, c)| (*p, *c))),
            self.comparison,
            self.rhs,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationProblem {
    pub total_capacity: f64,
    pub period_cap: PeriodCap,
    pub distributions: BTreeMap<u32, PriceDistribution>,
    pub num_samples: usize,
    pub constraints: Vec<PeriodConstraint>,
    pub formulation: Formulation,
}

impl AllocationProblem {
    pub fn new(
        total_capacity: f64,
        period_cap: PeriodCap,
        distributions: BTreeMap<u32, PriceDistribution>,
        num_samples: usize,
    ) -> Self {
        AllocationProblem {
            total_capacity,
            period_cap,
            distributions,
            num_samples,
            constraints: Vec::new(),
            formulation: Formulation::default(),
        }
    }

    pub fn with_constraint(mut self, constraint: PeriodConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_formulation(mut self, formulation: Formulation) -> Self {
        self.formulation = formulation;
        self
    }

    /// Fails fast on inputs the solver should never see.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.distributions.is_empty() {
            return Err(ModelError::NoPeriods);
        }
        if self.num_samples == 0 {
            return Err(ModelError::NoSamples);
        }
        if !self.total_capacity.is_finite() || self.total_capacity < 0.0 {
            return Err(ModelError::InvalidCapacity(self.total_capacity));
        }

        for (period, dist) in &self.distributions {
            dist.validate(*period)?;
            let cap = self
                .period_cap
                .cap_for(*period)
                .ok_or(ModelError::MissingPeriodCap(*period))?;
            if !cap.is_finite() || cap < 0.0 {
                return Err(ModelError::InvalidPeriodCap {
                    period: *period,
                    cap,
                });
            }
        }

        if let PeriodCap::PerPeriod(caps) = &self.period_cap {
            if let Some(period) = caps.keys().find(|p| !self.distributions.contains_key(*p)) {
                return Err(ModelError::UnknownPeriod(*period));
            }
        }

        for (idx, constraint) in self.constraints.iter().enumerate() {
            if constraint.coefficients.is_empty() {
                return Err(ModelError::EmptyConstraint(idx));
            }
            if !constraint.rhs.is_finite() {
                return Err(ModelError::NonFiniteRhs(idx));
            }
            for (period, coeff) in &constraint.coefficients {
                if !self.distributions.contains_key(period) {
                    return Err(ModelError::UnknownPeriod(*period));
                }
                if !coeff.is_finite() {
                    return Err(ModelError::NonFiniteCoefficient {
                        id: period_variable(*period),
                    });
                }
            }
        }

        Ok(())
    }

    /// Rejects problems whose sample matrix would exceed `limit` cells.
    pub fn check_sample_budget(&self, limit: usize) -> Result<(), ModelError> {
        let periods = self.distributions.len();
        let samples = self.num_samples;
        match periods.checked_mul(samples) {
            Some(cells) if cells <= limit => Ok(()),
            _ => Err(ModelError::TooManySamples {
                periods,
                samples,
                limit,
            }),
        }
    }

    /// Assembles the LP for an already drawn sample matrix.
    pub fn build_model(&self, samples: &SampleMatrix) -> Result<LpModel, ModelError> {
        self.validate()?;

        // The matrix must cover exactly the distribution table's periods
        if let Some(period) = samples.periods().find(|p| !self.distributions.contains_key(p)) {
            return Err(ModelError::UnknownPeriod(period));
        }
        if let Some(period) = self
            .distributions
            .keys()
            .find(|p| samples.samples(**p).is_none())
        {
            return Err(ModelError::UnknownPeriod(*period));
        }

        let mut model = LpModel::maximize().with_objective(self.formulation.build(samples));

        for period in self.distributions.keys() {
            let cap = self
                .period_cap
                .cap_for(*period)
                .ok_or(ModelError::MissingPeriodCap(*period))?;
            model.add_variable(VariableDef::new(period_variable(*period), 0.0, cap));
        }

        model.add_constraint(
            Constraint::le(total(self.distributions.keys().copied()), self.total_capacity)
                .named(TOTAL_CAPACITY_CONSTRAINT),
        );
        for (idx, constraint) in self.constraints.iter().enumerate() {
            model.add_constraint(constraint.to_constraint().named(format!("extra_{}", idx)));
        }

        Ok(model)
    }
}

/// Optimal quantities per period
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub objective: f64,
    pub quantities: BTreeMap<u32, f64>,
}

impl Allocation {
    pub fn quantity(&self, period: u32) -> f64 {
        self.quantities.get(&period).copied().unwrap_or(0.0)
    }
}

/// Everything a report needs: the drawn samples, who solved, and how it went.
#[derive(Debug, Clone)]
pub struct AllocationRun {
    pub samples: SampleMatrix,
    pub solver: String,
    pub outcome: Result<Allocation, SolveError>,
}

/// Samples prices, assembles the LP and solves it.
///
/// Malformed input is returned as `Err` before sampling; solver outcomes
/// (including infeasible and unbounded) land in [`AllocationRun::outcome`].
pub fn solve_allocation(
    problem: &AllocationProblem,
    generator: &mut SampleGenerator,
    solver: &dyn Solver,
) -> Result<AllocationRun, ModelError> {
    problem.validate()?;
    let samples = generator.generate(&problem.distributions, problem.num_samples)?;
    solve_with_samples(problem, samples, solver)
}

/// Like [`solve_allocation`] with a caller-supplied sample matrix.
pub fn solve_with_samples(
    problem: &AllocationProblem,
    samples: SampleMatrix,
    solver: &dyn Solver,
) -> Result<AllocationRun, ModelError> {
    let model = problem.build_model(&samples)?;
    debug!(
        "allocation model: {} periods, {} constraints, {:?} objective",
        model.variables.len(),
        model.constraints.len(),
        problem.formulation
    );

    let outcome = match solver.solve(&model) {
        Ok(solution) => {
            let quantities = problem
                .distributions
                .keys()
                .map(|period| (*period, solution.value(&period_variable(*period))))
                .collect();
            info!(
                "{} solved allocation over {} periods, objective {:.4}",
                solver.name(),
                problem.distributions.len(),
                solution.objective
            );
            Ok(Allocation {
                objective: solution.objective,
                quantities,
            })
        }
        Err(error) => {
            warn!("{} could not solve allocation: {}", solver.name(), error);
            Err(error)
        }
    };

    Ok(AllocationRun {
        samples,
        solver: solver.name().to_string(),
        outcome,
    })
}
