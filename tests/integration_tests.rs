use actix_web::{test, web, App};
use serde_json::{json, Value};

use stochastic_lp::api::{configure, json_config, AppState, API_KEY_HEADER};
use stochastic_lp::config::AppConfig;

fn state(config: AppConfig) -> web::Data<AppState> {
    web::Data::new(AppState::new(config))
}

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .app_data(json_config(2 * 1024 * 1024))
                .configure(configure),
        )
        .await
    };
}

fn two_period_request() -> Value {
    json!({
        "total_capacity": 100,
        "period_cap": 60,
        "distributions": {
            "1": {"mean": 50, "std": 0},
            "2": {"mean": 30, "std": 0}
        },
        "num_samples": 20,
        "seed": 5
    })
}

fn assert_close(value: &Value, expected: f64) {
    let actual = value.as_f64().expect("number");
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {}, got {}",
        expected,
        actual
    );
}

#[actix_web::test]
async fn test_health_endpoint() {
    let app = test_app!(state(AppConfig::default()));

    let req = test::TestRequest::get().uri("/health").to_request();
    let body = test::call_and_read_body(&app, req).await;

    assert_eq!(body, web::Bytes::from_static(b"OK"));
}

#[actix_web::test]
async fn test_solve_valid_request() {
    let app = test_app!(state(AppConfig::default()));

    let request_body = json!({
        "program": {
            "variables": [
                {"id": "x1", "bound": [0, null]},
                {"id": "x2", "bound": [0, null]}
            ],
            "constraints": [
                {"coefficients": {"x1": 1, "x2": 1}, "comparison": "le", "rhs": 40},
                {"coefficients": {"x1": 2, "x2": 1}, "comparison": "le", "rhs": 60}
            ]
        },
        "objectives": [{"x1": 4, "x2": 3}],
        "direction": "maximize"
    });

    let req = test::TestRequest::post()
        .uri("/solve")
        .set_json(&request_body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    let solution = &body["solutions"][0];
    assert_eq!(solution["status"], "optimal");
    assert_close(&solution["objective"], 140.0);
    assert_close(&solution["solution"]["x1"], 20.0);
    assert_close(&solution["solution"]["x2"], 20.0);
}

#[actix_web::test]
async fn test_solve_minimize_direction() {
    let app = test_app!(state(AppConfig::default()));

    let request_body = json!({
        "program": {
            "variables": [
                {"id": "x1", "bound": [0, 5]},
                {"id": "x2", "bound": [0, 5]}
            ],
            "constraints": [
                {"coefficients": {"x1": 1, "x2": 1}, "comparison": "ge", "rhs": 2}
            ]
        },
        "objectives": [{"x1": 1, "x2": 3}],
        "direction": "minimize"
    });

    let req = test::TestRequest::post()
        .uri("/solve")
        .set_json(&request_body)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_close(&body["solutions"][0]["objective"], 2.0);
    assert_close(&body["solutions"][0]["solution"]["x1"], 2.0);
}

#[actix_web::test]
async fn test_solve_invalid_json() {
    let app = test_app!(state(AppConfig::default()));

    let req = test::TestRequest::post()
        .uri("/solve")
        .insert_header(("content-type", "application/json"))
        .set_payload("invalid json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn test_solve_unknown_variable_is_bad_request() {
    let app = test_app!(state(AppConfig::default()));

    let request_body = json!({
        "program": {"variables": [{"id": "x1", "bound": [0, 1]}]},
        "objectives": [{"x9": 1}],
        "direction": "maximize"
    });

    let req = test::TestRequest::post()
        .uri("/solve")
        .set_json(&request_body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Objective contains missing variable x9");
}

#[actix_web::test]
async fn test_solve_unknown_solver_is_bad_request() {
    let app = test_app!(state(AppConfig::default()));

    let request_body = json!({
        "program": {"variables": [{"id": "x1", "bound": [0, 1]}]},
        "objectives": [{"x1": 1}],
        "direction": "maximize",
        "solver": "cplex"
    });

    let req = test::TestRequest::post()
        .uri("/solve")
        .set_json(&request_body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_stochastic_two_period_allocation() {
    let app = test_app!(state(AppConfig::default()));

    let req = test::TestRequest::post()
        .uri("/stochastic")
        .set_json(two_period_request())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "optimal");
    assert_eq!(body["solver"], "microlp");
    assert_close(&body["objective"], 4200.0);

    let periods = body["periods"].as_array().unwrap();
    assert_eq!(periods.len(), 2);
    assert_eq!(periods[0]["period"], 1);
    assert_close(&periods[0]["mean_price"], 50.0);
    assert_close(&periods[0]["allocation"], 60.0);
    assert_close(&periods[1]["allocation"], 40.0);
    assert_close(&periods[1]["stats"]["median"], 30.0);
}

#[actix_web::test]
async fn test_stochastic_infeasible_reports_status() {
    let app = test_app!(state(AppConfig::default()));

    let mut request_body = two_period_request();
    request_body["constraints"] = json!([
        {"coefficients": {"1": 1}, "comparison": "ge", "rhs": 200}
    ]);

    let req = test::TestRequest::post()
        .uri("/stochastic")
        .set_json(&request_body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "infeasible");
    assert!(body["objective"].is_null());
    assert!(body["periods"][0]["allocation"].is_null());
    assert_eq!(body["error"], "problem is infeasible");
}

#[actix_web::test]
async fn test_stochastic_zero_samples_is_bad_request() {
    let app = test_app!(state(AppConfig::default()));

    let mut request_body = two_period_request();
    request_body["num_samples"] = json!(0);

    let req = test::TestRequest::post()
        .uri("/stochastic")
        .set_json(&request_body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "At least one sample per period is required");
}

#[actix_web::test]
async fn test_stochastic_oversized_sample_count_is_bad_request() {
    let app = test_app!(state(AppConfig::default()));

    let mut request_body = two_period_request();
    request_body["num_samples"] = json!(2_000_000_000_000u64);

    let req = test::TestRequest::post()
        .uri("/stochastic")
        .set_json(&request_body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    let message = body["error"].as_str().expect("error message");
    assert!(message.contains("exceeds the limit"), "{}", message);
}

#[actix_web::test]
async fn test_stochastic_mismatched_period_caps_is_bad_request() {
    let app = test_app!(state(AppConfig::default()));

    let mut request_body = two_period_request();
    request_body.as_object_mut().unwrap().remove("period_cap");
    request_body["period_caps"] = json!({"1": 60, "3": 60});

    let req = test::TestRequest::post()
        .uri("/stochastic")
        .set_json(&request_body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_seeded_stochastic_response_is_cached() {
    let app_state = state(AppConfig::default());
    let app = test_app!(app_state);

    let mut bodies = Vec::new();
    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/stochastic")
            .set_json(two_period_request())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        bodies.push(test::read_body(resp).await);
    }

    assert_eq!(app_state.stochastic_cache.len(), 1);
    assert_eq!(bodies[0], bodies[1]);
}

#[actix_web::test]
async fn test_unseeded_stochastic_response_is_not_cached() {
    let app_state = state(AppConfig::default());
    let app = test_app!(app_state);

    let mut request_body = two_period_request();
    request_body.as_object_mut().unwrap().remove("seed");

    let req = test::TestRequest::post()
        .uri("/stochastic")
        .set_json(&request_body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    assert!(app_state.stochastic_cache.is_empty());
}

#[actix_web::test]
async fn test_protected_mode_requires_api_key() {
    let config = AppConfig {
        protect: true,
        api_key: Some("secret".to_string()),
        ..AppConfig::default()
    };
    let app = test_app!(state(config));

    let req = test::TestRequest::post()
        .uri("/stochastic")
        .set_json(two_period_request())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let req = test::TestRequest::post()
        .uri("/stochastic")
        .insert_header((API_KEY_HEADER, "wrong"))
        .set_json(two_period_request())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let req = test::TestRequest::post()
        .uri("/stochastic")
        .insert_header((API_KEY_HEADER, "secret"))
        .set_json(two_period_request())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn test_nonexistent_endpoint() {
    let app = test_app!(state(AppConfig::default()));

    let req = test::TestRequest::get().uri("/nonexistent").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 404);
}
