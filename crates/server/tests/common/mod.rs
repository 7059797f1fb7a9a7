//! Common test utilities for in-process API testing.
//!
//! The fixture wires the full engine over a temporary database and
//! drives the real axum router with `tower::ServiceExt::oneshot`, so
//! tests exercise exactly what production serves without binding a
//! port.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use funil_core::{
    ApplicationGate, Config, Db, SqliteHistoryLedger, SqliteProcessStore, SqliteStageRegistry,
    TransitionEngine,
};
use funil_server::api::create_router;
use funil_server::state::AppState;

/// In-process server over a temporary database.
pub struct TestFixture {
    pub router: Router,
    _temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let db = Db::open(&db_path).expect("Failed to open test database");
        let registry = Arc::new(SqliteStageRegistry::new(db.clone()));
        let processes = Arc::new(SqliteProcessStore::new(db.clone()));
        let ledger = Arc::new(SqliteHistoryLedger::new(db));

        let engine = TransitionEngine::new(registry.clone(), processes.clone(), ledger);
        let gate = ApplicationGate::new(registry.clone(), processes.clone());

        let state = Arc::new(AppState::new(
            Config::default(),
            registry,
            processes,
            engine,
            gate,
        ));

        Self {
            router: create_router(state),
            _temp_dir: temp_dir,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .uri(path)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("Failed to build request");
        self.send(request).await
    }

    /// POST without a body, for endpoints whose body is optional.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        let request = Request::builder()
            .method("PUT")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("Failed to build request");
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Define a three-stage pipeline and return the stage ids in order.
pub async fn seed_three_stage_job(fixture: &TestFixture, job_id: &str) -> Vec<String> {
    let response = fixture
        .post(
            &format!("/api/v1/jobs/{}/stages", job_id),
            serde_json::json!({
                "stages": [
                    {"name": "Screening", "description": "Initial résumé screen"},
                    {"name": "Tech Interview", "description": "Technical deep dive"},
                    {"name": "Offer", "description": "Offer and negotiation"}
                ]
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    response.body["stages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap().to_string())
        .collect()
}

/// Register a pending candidature and return its id.
pub async fn seed_application(fixture: &TestFixture, job_id: &str) -> String {
    let response = fixture
        .post(
            "/api/v1/applications",
            serde_json::json!({"job_id": job_id, "candidate_id": "cand-1"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    response.body["id"].as_str().unwrap().to_string()
}

/// Accept an application and return the created process id.
pub async fn accept_application(fixture: &TestFixture, application_id: &str) -> String {
    let response = fixture
        .post_empty(&format!("/api/v1/applications/{}/accept", application_id))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    response.body["id"].as_str().unwrap().to_string()
}
