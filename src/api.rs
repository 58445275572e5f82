use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::{info, warn};

use crate::cache::{cache_key, ResponseCache};
use crate::config::AppConfig;
use crate::domain::solver::Solver;
use crate::domain::solver_factory::{create_solver, SolverType};
use crate::models::{SolveRequest, SolveResponse, StochasticRequest, StochasticResponse};
use crate::solve::{solve_request, solve_stochastic};

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Shared across workers
pub struct AppState {
    pub config: AppConfig,
    pub solve_cache: ResponseCache<SolveResponse>,
    pub stochastic_cache: ResponseCache<StochasticResponse>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        AppState {
            solve_cache: ResponseCache::new(config.cache_size),
            stochastic_cache: ResponseCache::new(config.cache_size),
            config,
        }
    }
}

fn bad_request(message: impl ToString) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({ "error": message.to_string() }))
}

fn authorize(req: &HttpRequest, config: &AppConfig) -> Result<(), HttpResponse> {
    if !config.protect {
        return Ok(());
    }
    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    match (provided, config.api_key.as_deref()) {
        (Some(given), Some(expected)) if given == expected => Ok(()),
        _ => {
            warn!("rejected request to {} without a valid API key", req.path());
            Err(HttpResponse::Unauthorized().json(serde_json::json!({ "error": "Invalid or missing API key" })))
        }
    }
}

/// The per-request solver override, else the configured default
fn resolve_solver(requested: Option<&str>, default: SolverType) -> Result<Box<dyn Solver>, HttpResponse> {
    let solver_type = match requested {
        Some(name) => SolverType::from_str(name)
            .ok_or_else(|| bad_request(format!("Unknown solver: {}", name)))?,
        None => default,
    };
    Ok(create_solver(solver_type))
}

// ---------- Route handlers ----------

/// POST /solve
pub async fn solve(
    http: HttpRequest,
    state: web::Data<AppState>,
    req: web::Json<SolveRequest>,
) -> HttpResponse {
    if let Err(response) = authorize(&http, &state.config) {
        return response;
    }
    let solver = match resolve_solver(req.solver.as_deref(), state.config.solver) {
        Ok(solver) => solver,
        Err(response) => return response,
    };

    let key = cache_key(solver.name(), &*req);
    if let Some(cached) = key.as_deref().and_then(|k| state.solve_cache.get(k)) {
        return HttpResponse::Ok().json(cached);
    }

    match solve_request(&req, solver.as_ref()) {
        Ok(response) => {
            if let Some(key) = key {
                state.solve_cache.put(key, response.clone());
            }
            HttpResponse::Ok().json(response)
        }
        Err(error) => bad_request(error),
    }
}

/// POST /stochastic
pub async fn stochastic(
    http: HttpRequest,
    state: web::Data<AppState>,
    req: web::Json<StochasticRequest>,
) -> HttpResponse {
    if let Err(response) = authorize(&http, &state.config) {
        return response;
    }
    let solver = match resolve_solver(req.solver.as_deref(), state.config.solver) {
        Ok(solver) => solver,
        Err(response) => return response,
    };

    // Unseeded runs draw fresh samples every time
    let key = req.seed.and_then(|_| cache_key(solver.name(), &*req));
    if let Some(cached) = key.as_deref().and_then(|k| state.stochastic_cache.get(k)) {
        return HttpResponse::Ok().json(cached);
    }

    match solve_stochastic(&req, solver.as_ref(), state.config.max_sample_cells) {
        Ok(response) => {
            info!(
                "stochastic allocation over {} periods: {:?}",
                response.periods.len(),
                response.status
            );
            if let Some(key) = key {
                state.stochastic_cache.put(key, response.clone());
            }
            HttpResponse::Ok().json(response)
        }
        Err(error) => bad_request(error),
    }
}

/// GET /health
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("OK")
}

/// JSON extractor config: payload limit and a JSON body for parse errors
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _| {
            let err_string = err.to_string();
            actix_web::error::InternalError::from_response(err, bad_request(err_string)).into()
        })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/solve", web::post().to(solve))
        .route("/stochastic", web::post().to(stochastic))
        .route("/health", web::get().to(health_check));
}
