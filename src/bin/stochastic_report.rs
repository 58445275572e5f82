//! Runs a stochastic allocation and prints the report.
//!
//! Usage: `stochastic_report [scenario.json]`
//!
//! Without an argument the built-in electricity scenario is used: 1000
//! units to sell over 10 periods, at most 550 per period, with normally
//! distributed prices. `SEED`, `NUM_SAMPLES` and `SOLVER` override the
//! scenario's values.

use std::collections::BTreeMap;
use std::env;
use std::error::Error;
use std::fs;
use std::process::ExitCode;

use dotenv::dotenv;
use log::{error, info};

use stochastic_lp::convert::to_allocation_problem;
use stochastic_lp::domain::allocation::solve_allocation;
use stochastic_lp::domain::sampling::{PriceDistribution, SampleGenerator};
use stochastic_lp::domain::solver_factory::{create_solver, SolverType};
use stochastic_lp::models::StochasticRequest;
use stochastic_lp::report;

fn electricity_scenario() -> StochasticRequest {
    let prices = [
        (50.0, 10.0),
        (30.0, 5.0),
        (70.0, 15.0),
        (60.0, 8.0),
        (80.0, 20.0),
    ];
    // two identical five-period cycles
    let distributions: BTreeMap<u32, PriceDistribution> = (1..=10u32)
        .map(|t| {
            let (mean, std) = prices[((t - 1) % 5) as usize];
            (t, PriceDistribution::new(mean, std))
        })
        .collect();

    StochasticRequest {
        total_capacity: 1000.0,
        period_cap: Some(550.0),
        period_caps: None,
        distributions,
        num_samples: 100,
        seed: None,
        constraints: Vec::new(),
        formulation: Default::default(),
        solver: None,
    }
}

fn load_scenario() -> Result<StochasticRequest, Box<dyn Error>> {
    let mut request = match env::args().nth(1) {
        Some(path) => {
            info!("reading scenario from {}", path);
            serde_json::from_str(&fs::read_to_string(&path)?)?
        }
        None => electricity_scenario(),
    };

    if let Ok(seed) = env::var("SEED") {
        request.seed = Some(seed.trim().parse()?);
    }
    if let Ok(samples) = env::var("NUM_SAMPLES") {
        request.num_samples = samples.trim().parse()?;
    }
    if let Ok(solver) = env::var("SOLVER") {
        request.solver = Some(solver);
    }
    Ok(request)
}

fn run() -> Result<bool, Box<dyn Error>> {
    let request = load_scenario()?;

    let solver_type = match request.solver.as_deref() {
        Some(name) => {
            SolverType::from_str(name).ok_or_else(|| format!("Unknown solver: {}", name))?
        }
        None => SolverType::default(),
    };
    let solver = create_solver(solver_type);

    let problem = to_allocation_problem(&request)?;
    let mut generator = SampleGenerator::new(request.seed);
    let run = solve_allocation(&problem, &mut generator, solver.as_ref())?;

    print!("{}", report::render(&run));
    Ok(run.outcome.is_ok())
}

fn main() -> ExitCode {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
