use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use valora_api::{app, AppState};
use valora_catalog::PricingConfig;
use valora_shared::RunEvent;
use valora_store::{CsvPersonRepository, RunConfig};

async fn test_state(dir: &TempDir) -> AppState {
    let people = CsvPersonRepository::open(dir.path().join("people.csv"))
        .await
        .unwrap();
    let runs = RunConfig {
        default_record_count: 10_000,
        default_worker_count: Some(2),
        checkpoint_interval: 2_500,
        max_record_count: 1_000_000,
    };
    AppState::new(PricingConfig::default(), Arc::new(people), runs).unwrap()
}

async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let dir = TempDir::new().unwrap();
    let router = app(test_state(&dir).await);

    let (status, body) = send(&router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_serial_and_parallel_runs_agree() {
    let dir = TempDir::new().unwrap();
    let router = app(test_state(&dir).await);

    let (status, serial) = send(
        &router,
        "POST",
        "/v1/runs/serial",
        Some(json!({ "record_count": 20_000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serial["mode"], "SERIAL");
    assert_eq!(serial["record_count"], 20_000);
    assert!(serial.get("cores_used").is_none());
    assert!(serial["total_time"].as_f64().unwrap() >= serial["execution_time"].as_f64().unwrap());

    let (status, parallel) = send(
        &router,
        "POST",
        "/v1/runs/parallel",
        Some(json!({ "record_count": 20_000, "worker_count": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parallel["cores_used"], 3);

    for key in ["total_value", "total_taxes", "total_freight", "total_discount", "total_final"] {
        let s = serial[key].as_f64().unwrap();
        let p = parallel[key].as_f64().unwrap();
        assert!((s - p).abs() / s.abs() < 1e-6, "{} differs: {} vs {}", key, s, p);
    }
}

#[tokio::test]
async fn test_run_defaults_come_from_config() {
    let dir = TempDir::new().unwrap();
    let router = app(test_state(&dir).await);

    let (status, body) = send(&router, "POST", "/v1/runs/parallel", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["record_count"], 10_000);
    assert_eq!(body["cores_used"], 2);
}

#[tokio::test]
async fn test_invalid_run_arguments_are_rejected() {
    let dir = TempDir::new().unwrap();
    let router = app(test_state(&dir).await);

    for body in [
        json!({ "record_count": 0 }),
        json!({ "record_count": -3 }),
        json!({ "record_count": 2_000_000 }),
    ] {
        let (status, err) = send(&router, "POST", "/v1/runs/serial", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(err["error"].is_string());
    }

    let (status, _) = send(
        &router,
        "POST",
        "/v1/runs/parallel",
        Some(json!({ "record_count": 10, "worker_count": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, err) = send(
        &router,
        "POST",
        "/v1/runs/parallel",
        Some(json!({ "record_count": 10, "worker_count": i64::MAX })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].as_str().unwrap().contains("worker count"));
}

#[tokio::test]
async fn test_run_history_and_events() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let mut events = state.run_tx.subscribe();
    let router = app(state);

    let (status, run) = send(
        &router,
        "POST",
        "/v1/runs/serial",
        Some(json!({ "record_count": 10_000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // 10_000 records at a 2_500 interval
    let mut progress = Vec::new();
    loop {
        match events.recv().await.unwrap() {
            RunEvent::Progress(p) => progress.push(p.processed),
            RunEvent::Completed(c) => {
                assert_eq!(c.run_id.to_string(), run["run_id"].as_str().unwrap());
                break;
            }
            RunEvent::Failed(f) => panic!("unexpected failure: {}", f.reason),
        }
    }
    assert_eq!(progress, vec![2_500, 5_000, 7_500, 10_000]);

    let (status, history) = send(&router, "GET", "/v1/runs", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["run_id"], run["run_id"]);
}

#[tokio::test]
async fn test_order_valuation() {
    let dir = TempDir::new().unwrap();
    let router = app(test_state(&dir).await);

    let (status, body) = send(&router, "GET", "/v1/orders/1/valuation", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attributes"]["region"], "RJ");
    assert_eq!(body["attributes"]["is_priority"], true);
    assert!((body["breakdown"]["total"].as_f64().unwrap() - 79.83675).abs() < 1e-9);

    let (status, _) = send(&router, "GET", "/v1/orders/0/valuation", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_people_crud() {
    let dir = TempDir::new().unwrap();
    let router = app(test_state(&dir).await);

    let (status, ana) = send(
        &router,
        "POST",
        "/v1/people",
        Some(json!({
            "name": "Ana Souza",
            "email": "ana@example.com",
            "phone": "(11) 91234-5678",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(ana["id"], 1);
    assert_eq!(ana["phone"], "11912345678");

    send(
        &router,
        "POST",
        "/v1/people",
        Some(json!({
            "name": "Bruno Lima",
            "email": "bruno@example.com",
            "phone": "21 99876-5432",
        })),
    )
    .await;

    let (_, count) = send(&router, "GET", "/v1/people/count", None).await;
    assert_eq!(count["count"], 2);

    let (status, found) = send(&router, "GET", "/v1/people?name=an", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["name"], "Ana Souza");

    let (status, updated) = send(
        &router,
        "PUT",
        "/v1/people/1",
        Some(json!({ "email": "ana.souza@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["email"], "ana.souza@example.com");
    assert_eq!(updated["name"], "Ana Souza");

    let (status, _) = send(&router, "DELETE", "/v1/people/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&router, "GET", "/v1/people/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&router, "DELETE", "/v1/people", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, all) = send(&router, "GET", "/v1/people", None).await;
    assert!(all.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_people_validation() {
    let dir = TempDir::new().unwrap();
    let router = app(test_state(&dir).await);

    let (status, _) = send(
        &router,
        "POST",
        "/v1/people",
        Some(json!({ "name": "Ana", "email": "not-an-email", "phone": "1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &router,
        "POST",
        "/v1/people",
        Some(json!({ "name": "Ana", "email": "ana@example.com", "phone": "--" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&router, "PUT", "/v1/people/42", Some(json!({ "name": "X" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_after_run() {
    let dir = TempDir::new().unwrap();
    let router = app(test_state(&dir).await);

    send(&router, "POST", "/v1/runs/serial", Some(json!({ "record_count": 1_000 }))).await;

    let (status, body) = send(&router, "GET", "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().unwrap();
    assert!(text.contains("valora_runs_total{mode=\"serial\"} 1"));
    assert!(text.contains("valora_records_valued_total 1000"));
}
