use crate::domain::allocation::{
    AllocationProblem, AllocationRun, PeriodCap, PeriodConstraint,
};
use crate::domain::expr::{Constraint, LinearExpr};
use crate::domain::model::{LpModel, VariableDef};
use crate::domain::solver::{Solution, SolveError};
use crate::domain::validate::ModelError;
use crate::models::{
    ApiConstraint, ApiLinearProgram, ApiPeriod, ApiPeriodConstraint, ApiSolution,
    ObjectiveOwned, SolverDirection, Status, StochasticRequest, StochasticResponse,
};
use crate::report::BoxStats;

pub fn to_linear_expr(coefficients: &ObjectiveOwned) -> LinearExpr {
    coefficients
        .iter()
        .map(|(id, coeff)| (id.as_str(), *coeff))
        .collect()
}

fn to_constraint(c: &ApiConstraint) -> Constraint {
    Constraint::new(to_linear_expr(&c.coefficients), c.comparison, c.rhs)
}

/// One model per objective; variables and constraints are shared.
pub fn to_lp_model(
    program: &ApiLinearProgram,
    objective: &ObjectiveOwned,
    direction: SolverDirection,
) -> LpModel {
    let variables = program
        .variables
        .iter()
        .map(|v| {
            let (lower, upper) = v.bound;
            VariableDef::new(v.id.clone(), lower, upper.unwrap_or(f64::INFINITY))
        })
        .collect();

    LpModel {
        variables,
        objective: to_linear_expr(objective),
        direction,
        constraints: program.constraints.iter().map(to_constraint).collect(),
    }
}

impl From<&SolveError> for Status {
    fn from(e: &SolveError) -> Self {
        match e {
            SolveError::Infeasible => Status::Infeasible,
            SolveError::Unbounded => Status::Unbounded,
            SolveError::InvalidModel(_) | SolveError::Backend { .. } => Status::SolverFailed,
        }
    }
}

impl From<Result<Solution, SolveError>> for ApiSolution {
    fn from(result: Result<Solution, SolveError>) -> Self {
        match result {
            Ok(s) => ApiSolution {
                status: Status::Optimal,
                objective: Some(s.objective),
                solution: s.values,
                error: None,
            },
            Err(e) => ApiSolution {
                status: Status::from(&e),
                objective: None,
                solution: Default::default(),
                error: Some(e.to_string()),
            },
        }
    }
}

fn to_period_cap(req: &StochasticRequest) -> Result<PeriodCap, ModelError> {
    match (req.period_cap, &req.period_caps) {
        (Some(cap), None) => Ok(PeriodCap::Uniform(cap)),
        (None, Some(caps)) => Ok(PeriodCap::PerPeriod(caps.clone())),
        _ => Err(ModelError::AmbiguousPeriodCap),
    }
}

fn to_period_constraint(c: &ApiPeriodConstraint) -> PeriodConstraint {
    PeriodConstraint::new(c.coefficients.clone(), c.comparison, c.rhs)
}

pub fn to_allocation_problem(req: &StochasticRequest) -> Result<AllocationProblem, ModelError> {
    let problem = AllocationProblem {
        total_capacity: req.total_capacity,
        period_cap: to_period_cap(req)?,
        distributions: req.distributions.clone(),
        num_samples: req.num_samples,
        constraints: req.constraints.iter().map(to_period_constraint).collect(),
        formulation: req.formulation,
    };
    problem.validate()?;
    Ok(problem)
}

impl From<&AllocationRun> for StochasticResponse {
    fn from(run: &AllocationRun) -> Self {
        let allocation = run.outcome.as_ref().ok();

        let periods = run
            .samples
            .rows()
            .map(|(period, row)| ApiPeriod {
                period,
                mean_price: row.iter().sum::<f64>() / row.len() as f64,
                allocation: allocation.map(|a| a.quantity(period)),
                stats: BoxStats::from_samples(row),
            })
            .collect();

        match &run.outcome {
            Ok(a) => StochasticResponse {
                status: Status::Optimal,
                solver: run.solver.clone(),
                objective: Some(a.objective),
                periods,
                error: None,
            },
            Err(e) => StochasticResponse {
                status: Status::from(e),
                solver: run.solver.clone(),
                objective: None,
                periods,
                error: Some(e.to_string()),
            },
        }
    }
}
