//! End-to-end tests over a real listener.

use std::sync::Arc;

use chokepoint::config::Config;
use chokepoint::server::router;
use chokepoint::service::WorkService;
use serde_json::json;

async fn spawn_server(config: Config) -> (String, Arc<WorkService>) {
    let service = Arc::new(WorkService::new(config).expect("failed to build service"));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind");
    let addr = listener.local_addr().unwrap();
    let app = router(Arc::clone(&service));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), service)
}

#[tokio::test]
async fn work_round_trip_returns_success_reply() {
    let (base, service) = spawn_server(Config {
        delay_ms: 1,
        fail_rate: 0.0,
    })
    .await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/work"))
        .json(&json!({"id": "req-1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["code"], json!("SUCCESS"));
    assert!(body["latency_ms"].is_u64());

    let snap = service.counters().snapshot();
    assert_eq!(snap.received, 1);
    assert_eq!(snap.completed, 1);
}

#[tokio::test]
async fn injected_failure_maps_to_429() {
    let (base, service) = spawn_server(Config {
        delay_ms: 1,
        fail_rate: 1.0,
    })
    .await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/work"))
        .json(&json!({"id": ""}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 429);
    assert_eq!(resp.text().await.unwrap(), "rate limited");

    let snap = service.counters().snapshot();
    assert_eq!(snap.failed, 1);
    assert_eq!(snap.started, 0);
}

#[tokio::test]
async fn metrics_endpoint_exposes_counters_and_histograms() {
    let (base, _service) = spawn_server(Config {
        delay_ms: 1,
        fail_rate: 0.25,
    })
    .await;

    let client = reqwest::Client::new();
    client
        .post(format!("{base}/work"))
        .json(&json!({"id": "m-1"}))
        .send()
        .await
        .unwrap();

    let resp = client.get(format!("{base}/metrics")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let content_type = resp.headers()[reqwest::header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/plain"));

    let body = resp.text().await.unwrap();
    assert!(body.contains("work_requests_received_total 1"));
    assert!(body.contains("work_requests_failed_total{reason=\"fail_injection\"}"));
    assert!(body.contains("work_request_latency_ms_bucket"));
    assert!(body.contains("work_processing_latency_ms_bucket"));
    assert!(body.contains("work_queue_wait_ms_bucket"));
    assert!(body.contains("work_busy 0"));
    assert!(body.contains("work_fail_rate 0.25"));
}

#[tokio::test]
async fn healthz_always_serving() {
    let (base, _service) = spawn_server(Config::default()).await;

    let resp = reqwest::get(format!("{base}/healthz")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "SERVING");
}
