//! End-to-end tests for the HTTP boundary
//!
//! Drives the axum router in-process with `tower::ServiceExt::oneshot`. Model
//! backends point at a wiremock server; persistence is either an in-memory
//! SQLite database or a mockall mock of the store.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use mockall::mock;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::{
    matchers::{body_partial_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

use decision_impact_simulator::analysis::{AnalysisRequester, DecisionSimulator};
use decision_impact_simulator::backend::{backends_from_config, ChatClient};
use decision_impact_simulator::config::{
    FallbackPolicy, ModelConfig, ProviderConfig, RequestConfig, ServerConfig,
};
use decision_impact_simulator::error::{StorageError, StorageResult};
use decision_impact_simulator::server::{self, AppState};
use decision_impact_simulator::storage::{DecisionStore, SqliteStorage, StoredDecision};

const PRIMARY: &str = "groq:primary-model";
const FALLBACK: &str = "groq:fallback-model";

mock! {
    pub Store {}

    #[async_trait]
    impl DecisionStore for Store {
        async fn save(
            &self,
            decision: &str,
            response: &Value,
            model_used: &str,
            fallback_used: bool,
        ) -> StorageResult<i64>;
        async fn get(&self, id: i64) -> StorageResult<Option<StoredDecision>>;
        async fn recent(&self, limit: u32) -> StorageResult<Vec<StoredDecision>>;
    }
}

fn analysis_json(confidence: i64) -> Value {
    let outcome = |title: &str| {
        json!({
            "title": title,
            "description": "How it plays out",
            "likelihood": "medium",
            "impact": "moderate"
        })
    };
    json!({
        "decision_summary": "Financing a laptop on EMI",
        "risks": [{"risk": "Cash flow", "impact_level": "high", "explanation": "EMI near budget cap"}],
        "best_case": outcome("Career boost"),
        "worst_case": outcome("Debt spiral"),
        "most_likely_case": outcome("Tight months"),
        "alternatives": [{"option": "Cloud GPU credits", "why_safer": "No upfront debt"}],
        "confidence_score": confidence,
        "uncertainty_explanation": "Income variability"
    })
}

fn completion(content: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    }))
}

async fn mount_model(server: &MockServer, model: &str, response: ResponseTemplate, times: u64) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"model": model})))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}

fn build_app(server: &MockServer, store: Arc<dyn DecisionStore>) -> Router {
    let client = ChatClient::new(
        &ProviderConfig {
            api_key: "test-api-key".to_string(),
            base_url: server.uri(),
        },
        RequestConfig { timeout_ms: 5000 },
    )
    .unwrap();

    let models = ModelConfig {
        primary: PRIMARY.to_string(),
        fallback: FALLBACK.to_string(),
        temperature: 0.2,
        max_tokens: None,
    };
    let requester =
        AnalysisRequester::new(backends_from_config(&models, &client), FallbackPolicy::default());
    let simulator = DecisionSimulator::new(requester, store);

    server::router(Arc::new(AppState::new(simulator)), &ServerConfig::default())
}

fn analyze_request(body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/analyze-decision")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn laptop_body() -> Value {
    json!({
        "decision": "Buying an expensive laptop on EMI",
        "constraints": [
            {"constraint": "Monthly budget under 10k"},
            {"constraint": "Need it for ML work"}
        ]
    })
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_root_reports_running() {
    let server = MockServer::start().await;
    let storage = Arc::new(SqliteStorage::new_in_memory().await.unwrap());
    let app = build_app(&server, storage);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await, json!({"status": "Backend running"}));
}

#[tokio::test]
async fn test_primary_success_is_persisted() {
    let server = MockServer::start().await;
    mount_model(&server, "primary-model", completion(analysis_json(77).to_string()), 1).await;
    mount_model(&server, "fallback-model", completion(analysis_json(10).to_string()), 0).await;

    let storage = Arc::new(SqliteStorage::new_in_memory().await.unwrap());
    let app = build_app(&server, storage.clone());

    let response = app.oneshot(analyze_request(laptop_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["model_used"], PRIMARY);
    assert_eq!(body["fallback_used"], false);
    assert_eq!(body["analysis"], analysis_json(77));

    let records = storage.recent(10).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].decision, "Buying an expensive laptop on EMI");
    assert_eq!(records[0].model_used, PRIMARY);
    assert!(!records[0].fallback_used);
    assert_eq!(records[0].response, body["analysis"]);

    let sent = server.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&sent[0].body).unwrap();
    assert!(sent["messages"][1]["content"]
        .as_str()
        .unwrap()
        .contains("Constraints:\n- Monthly budget under 10k\n- Need it for ML work"));
}

#[tokio::test]
async fn test_primary_failure_uses_fallback() {
    let server = MockServer::start().await;
    mount_model(
        &server,
        "primary-model",
        ResponseTemplate::new(503).set_body_string("overloaded"),
        1,
    )
    .await;
    mount_model(&server, "fallback-model", completion(analysis_json(35).to_string()), 1).await;

    let storage = Arc::new(SqliteStorage::new_in_memory().await.unwrap());
    let app = build_app(&server, storage.clone());

    let response = app.oneshot(analyze_request(laptop_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["model_used"], FALLBACK);
    assert_eq!(body["fallback_used"], true);

    let records = storage.recent(10).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].model_used, FALLBACK);
    assert!(records[0].fallback_used);
}

#[tokio::test]
async fn test_invalid_primary_output_uses_fallback() {
    let server = MockServer::start().await;
    mount_model(&server, "primary-model", completion(analysis_json(150).to_string()), 1).await;
    mount_model(&server, "fallback-model", completion(analysis_json(60).to_string()), 1).await;

    let storage = Arc::new(SqliteStorage::new_in_memory().await.unwrap());
    let app = build_app(&server, storage);

    let response = app.oneshot(analyze_request(laptop_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["fallback_used"], true);
    assert_eq!(body["analysis"]["confidence_score"], 60);
}

#[tokio::test]
async fn test_both_backends_fail_nothing_persisted() {
    let server = MockServer::start().await;
    mount_model(
        &server,
        "primary-model",
        ResponseTemplate::new(500).set_body_string("primary down"),
        1,
    )
    .await;
    mount_model(&server, "fallback-model", completion("not json at all".to_string()), 1).await;

    let mut store = MockStore::new();
    store.expect_save().never();
    let app = build_app(&server, Arc::new(store));

    let response = app.oneshot(analyze_request(laptop_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = read_json(response).await;
    let detail = body["detail"].as_str().unwrap();
    assert!(
        detail.contains("schema validation"),
        "detail should describe the fallback's failure: {}",
        detail
    );
}

#[tokio::test]
async fn test_short_decision_rejected_before_backend_call() {
    let server = MockServer::start().await;
    mount_model(&server, "primary-model", completion(analysis_json(50).to_string()), 0).await;
    mount_model(&server, "fallback-model", completion(analysis_json(50).to_string()), 0).await;

    let mut store = MockStore::new();
    store.expect_save().never();
    let app = build_app(&server, Arc::new(store));

    let response = app
        .oneshot(analyze_request(json!({"decision": "Buy?!"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = read_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("decision"));
}

#[tokio::test]
async fn test_short_constraint_rejected() {
    let server = MockServer::start().await;
    let mut store = MockStore::new();
    store.expect_save().never();
    let app = build_app(&server, Arc::new(store));

    let response = app
        .oneshot(analyze_request(json!({
            "decision": "Moving to a new city for work",
            "constraints": [{"constraint": "no"}]
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json(response).await;
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .contains("constraints[0].constraint"));
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let server = MockServer::start().await;
    let mut store = MockStore::new();
    store.expect_save().never();
    let app = build_app(&server, Arc::new(store));

    let response = app
        .oneshot(analyze_request(json!({"decision": 42})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(read_json(response).await["detail"].is_string());
}

#[tokio::test]
async fn test_persistence_failure_is_server_error() {
    let server = MockServer::start().await;
    mount_model(&server, "primary-model", completion(analysis_json(80).to_string()), 1).await;

    let mut store = MockStore::new();
    store
        .expect_save()
        .withf(|decision, response, model_used, fallback_used| {
            decision == "Buying an expensive laptop on EMI"
                && response["confidence_score"] == 80
                && model_used == PRIMARY
                && !*fallback_used
        })
        .times(1)
        .returning(|_, _, _, _| {
            Err(StorageError::Connection {
                message: "disk full".to_string(),
            })
        });
    let app = build_app(&server, Arc::new(store));

    let response = app.oneshot(analyze_request(laptop_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("disk full"));
}

#[tokio::test]
async fn test_cors_allows_any_origin_by_default() {
    let server = MockServer::start().await;
    let storage = Arc::new(SqliteStorage::new_in_memory().await.unwrap());
    let app = build_app(&server, storage);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/analyze-decision")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}
