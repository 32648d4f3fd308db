mod common;

use chat_service::services::{MockSessionArchive, MockSessionStore};
use common::{TestApp, TestOptions};
use serde_json::Value;

#[tokio::test]
async fn liveness_returns_ok() {
    let app = TestApp::spawn().await;

    let res = app.client.get(app.url("/health")).send().await.unwrap();
    assert!(res.status().is_success());

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "chat-service");
}

#[tokio::test]
async fn api_health_reports_backends_up() {
    let app = TestApp::spawn().await;

    let body: Value = app
        .client
        .get(app.url("/api/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["api"], "up");
    assert_eq!(body["services"]["mongodb"], "up");
    assert_eq!(body["services"]["redis"], "up");
}

#[tokio::test]
async fn api_health_is_degraded_when_redis_is_down() {
    let app = TestApp::spawn_with(TestOptions {
        store: MockSessionStore::unhealthy(),
        ..Default::default()
    })
    .await;

    let res = app.client.get(app.url("/api/health")).send().await.unwrap();
    assert_eq!(res.status().as_u16(), 200);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["services"]["redis"], "down");
    assert_eq!(body["services"]["mongodb"], "up");
}

#[tokio::test]
async fn readiness_fails_when_mongo_is_down() {
    let app = TestApp::spawn_with(TestOptions {
        archive: MockSessionArchive::unhealthy(),
        ..Default::default()
    })
    .await;

    let res = app.client.get(app.url("/ready")).send().await.unwrap();
    assert_eq!(res.status().as_u16(), 503);
}

#[tokio::test]
async fn root_and_ping_describe_service() {
    let app = TestApp::spawn().await;

    let root: Value = app
        .client
        .get(app.url("/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(root["message"], "Chat Microservice API");
    assert_eq!(root["docs"], "/docs");
    assert_eq!(root["debug_mode"], true);

    let ping: Value = app
        .client
        .get(app.url("/ping"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ping["ping"], "pong");
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = TestApp::spawn().await;

    let res = app
        .client
        .get(app.url("/ping"))
        .header("x-request-id", "trace-me")
        .send()
        .await
        .unwrap();

    assert_eq!(res.headers()["x-request-id"], "trace-me");
}

#[tokio::test]
async fn metrics_endpoint_is_exposed() {
    let app = TestApp::spawn().await;
    app.client.get(app.url("/ping")).send().await.unwrap();

    let res = app.client.get(app.url("/metrics")).send().await.unwrap();
    assert!(res.status().is_success());
    let body = res.text().await.unwrap();
    assert!(body.contains("http_requests_total"));
    assert!(body.contains("path=\"/ping\""));
}
