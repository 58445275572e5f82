use log::debug;

use crate::convert::{to_allocation_problem, to_lp_model};
use crate::domain::allocation::solve_allocation;
use crate::domain::model::LpModel;
use crate::domain::sampling::SampleGenerator;
use crate::domain::solver::Solver;
use crate::domain::validate::{validate_model, ModelError};
use crate::models::{ApiSolution, SolveRequest, SolveResponse, StochasticRequest, StochasticResponse};

/// Solves every objective of `req` against the shared program.
///
/// All models are validated before the first solve, so a malformed
/// objective rejects the whole request.
pub fn solve_request(req: &SolveRequest, solver: &dyn Solver) -> Result<SolveResponse, ModelError> {
    if req.objectives.is_empty() {
        return Err(ModelError::NoObjectives);
    }

    let models: Vec<LpModel> = req
        .objectives
        .iter()
        .map(|objective| to_lp_model(&req.program, objective, req.direction))
        .collect();
    for model in &models {
        validate_model(model)?;
    }

    debug!(
        "solving {} objective(s) over {} variables with {}",
        models.len(),
        req.program.variables.len(),
        solver.name()
    );

    let solutions: Vec<ApiSolution> = models
        .iter()
        .map(|model| solver.solve(model).into())
        .collect();

    Ok(SolveResponse { solutions })
}

/// Samples, builds and solves the allocation described by `req`.
///
/// Requests needing more than `max_sample_cells` drawn prices are
/// rejected before sampling.
pub fn solve_stochastic(
    req: &StochasticRequest,
    solver: &dyn Solver,
    max_sample_cells: usize,
) -> Result<StochasticResponse, ModelError> {
    let problem = to_allocation_problem(req)?;
    problem.check_sample_budget(max_sample_cells)?;
    let mut generator = SampleGenerator::new(req.seed);
    let run = solve_allocation(&problem, &mut generator, solver)?;
    Ok(StochasticResponse::from(&run))
}
