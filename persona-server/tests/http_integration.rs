//! HTTP integration tests for the Persona REST API
//!
//! Drive the full Axum router with `oneshot`. The Sheets-backed tests point
//! the store at a wiremock server standing in for Sheets and Drive.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use persona_core::config::StoreConfig;
use persona_core::{
    GenerationError, MemoryRowStore, PersonaConfig, RowSchema, RowStore, SheetsConfig,
    SheetsRowStore, TextGenerator, FALLBACK_DESCRIPTION,
};
use persona_server::http::{build_router, HttpState};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fails narrative generation for one name, succeeds otherwise.
struct ScriptedGenerator {
    fail_for: &'static str,
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, name: &str, profession: &str, context: &str) -> Result<String, GenerationError> {
        if name == self.fail_for {
            return Err(GenerationError::Api {
                code: 503,
                message: "model unavailable".to_string(),
            });
        }
        Ok(format!("{name} works as a {profession}. {context}").trim().to_string())
    }

    async fn summarize(&self, name: &str, _narrative: &str) -> Result<String, GenerationError> {
        Ok(format!("{name} in one sentence."))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn memory_state(generator: Option<Arc<dyn TextGenerator>>) -> Arc<HttpState> {
    Arc::new(HttpState {
        store: Arc::new(MemoryRowStore::new()),
        generator,
        context: String::new(),
        config: PersonaConfig::default(),
    })
}

async fn send(state: Arc<HttpState>, req: Request<Body>) -> (StatusCode, Value) {
    let resp = build_router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn post_personas(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/personas")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

// ===========================================================================
// GET /version and /health
// ===========================================================================
#[tokio::test]
async fn test_version_endpoint() {
    let (status, json) = send(memory_state(None), get("/version")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["version"].is_string());
    assert_eq!(json["protocol"], "persona/1");
}

#[tokio::test]
async fn test_health_endpoint() {
    let (status, json) = send(memory_state(None), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["store"]["worksheet"], "Sheet1");
}

// ===========================================================================
// POST then GET /personas against the in-memory store
// ===========================================================================
#[tokio::test]
async fn test_submit_then_list_round_trip() {
    let state = memory_state(None);

    let (status, json) = send(
        state.clone(),
        post_personas(json!({
            "count": 3,
            "personas": [
                { "name": "Ana", "profession": "Pilot", "dob": "1990-04-01" },
                { "name": "", "profession": "Chef" },
                { "name": "Bo", "profession": "Clerk", "description": "Counts beans." }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["saved"].as_array().unwrap().len(), 2);
    assert_eq!(json["warnings"][0]["kind"], "skipped");
    assert_eq!(json["warnings"][0]["position"], 2);

    let (status, json) = send(state, get("/personas")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 2);
    assert_eq!(json["rows"][0]["name"], "Ana");
    assert_eq!(json["rows"][0]["id"], 1);
    assert_eq!(json["rows"][1]["name"], "Bo");
    assert_eq!(json["rows"][1]["id"], 3);
    assert_eq!(json["rows"][1]["description"], "Counts beans.");
}

#[tokio::test]
async fn test_list_empty_store_is_not_an_error() {
    let (status, json) = send(memory_state(None), get("/personas")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["rows"], json!([]));
    assert_eq!(json["message"], "No personas saved yet.");
}

#[tokio::test]
async fn test_submit_out_of_range_count_is_400() {
    let (status, json) = send(
        memory_state(None),
        post_personas(json!({ "count": 101, "personas": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("out of range"));
}

#[tokio::test]
async fn test_submit_with_generation_falls_back_per_record() {
    let generator: Arc<dyn TextGenerator> = Arc::new(ScriptedGenerator { fail_for: "Ana" });
    let state = memory_state(Some(generator));

    let (status, json) = send(
        state.clone(),
        post_personas(json!({
            "generate": true,
            "personas": [
                { "name": "Ana", "profession": "Pilot" },
                { "name": "Bo", "profession": "Clerk" }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["warnings"].as_array().unwrap().len(), 1);
    assert_eq!(json["warnings"][0]["kind"], "generation_failed");

    let rows = state.store.read_all().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].description, FALLBACK_DESCRIPTION);
    assert_eq!(rows[0].prompt, None);
    assert_eq!(rows[1].description, "Bo in one sentence.");
    assert_eq!(rows[1].prompt.as_deref(), Some("Bo works as a Clerk."));
}

// ===========================================================================
// Sheets-backed store through the router
// ===========================================================================

async fn sheets_state(server: &MockServer) -> Arc<HttpState> {
    Mock::given(method("GET"))
        .and(path("/spreadsheets/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "properties": { "title": "prompts_generated" },
            "sheets": [{ "properties": { "title": "Sheet1" } }]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/spreadsheets/abc123/values/'Sheet1'!1:1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [["ID", "Name", "DOB", "Profession", "Description"]]
        })))
        .mount(server)
        .await;

    let store_config = StoreConfig {
        url: Some("https://docs.google.com/spreadsheets/d/abc123/edit".to_string()),
        ..StoreConfig::default()
    };
    let sheets = SheetsConfig {
        token: "token".to_string(),
        sheets_base_url: server.uri(),
        drive_base_url: server.uri(),
        schema: RowSchema::base(),
    };
    let store = SheetsRowStore::resolve(&store_config, sheets).await.unwrap();

    Arc::new(HttpState {
        store: Arc::new(store),
        generator: None,
        context: String::new(),
        config: PersonaConfig::default(),
    })
}

#[tokio::test]
async fn test_sheets_submit_appends_each_valid_row() {
    let server = MockServer::start().await;
    let state = sheets_state(&server).await;

    Mock::given(method("POST"))
        .and(path("/spreadsheets/abc123/values/'Sheet1':append"))
        .and(body_json(json!({ "values": [[1, "Ana", "", "Pilot", ""]] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/spreadsheets/abc123/values/'Sheet1':append"))
        .and(body_json(json!({ "values": [[3, "Bo", "", "Clerk", ""]] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let (status, json) = send(
        state,
        post_personas(json!({
            "personas": [
                { "name": "Ana", "profession": "Pilot" },
                { "name": "Cy", "profession": "" },
                { "name": "Bo", "profession": "Clerk" }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["saved"].as_array().unwrap().len(), 2);
    assert_eq!(json["message"], "All personas saved!");
}

#[tokio::test]
async fn test_sheets_read_error_is_502() {
    let server = MockServer::start().await;
    let state = sheets_state(&server).await;

    Mock::given(method("GET"))
        .and(path("/spreadsheets/abc123/values/'Sheet1'"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "code": 500, "message": "Internal error" }
        })))
        .mount(&server)
        .await;

    let (status, json) = send(state, get("/personas")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["status"], "error");
}
