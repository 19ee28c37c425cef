pub mod config;
pub mod metrics;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use intent::{AssistedClassifier, IntentCache, IntentClassifier, KeywordClassifier, OllamaCompleter};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use store::FileStore;
use tower_http::trace::TraceLayer;
use workflow::{CheckpointStore, QueryRequest, ResponseOutput, WorkflowEngine};

use crate::config::{AppConfig, ClassifierMode};
use crate::metrics::{Metrics, MetricsSnapshot, TimedOperation};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<WorkflowEngine>,
    pub metrics: Arc<Metrics>,
    pub data_dir: PathBuf,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            engine: Arc::new(build_engine(config)),
            metrics: Metrics::new(),
            data_dir: config.data_dir.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub data_dir: String,
    pub store_readable: bool,
    pub classifier: String,
    pub conversations: usize,
}

pub fn build_engine(config: &AppConfig) -> WorkflowEngine {
    let store = Arc::new(FileStore::new(config.data_dir.clone()));
    let keywords = KeywordClassifier::new(config.keywords.clone());

    let classifier: Arc<dyn IntentClassifier> = match config.classifier {
        ClassifierMode::Keyword => Arc::new(keywords),
        ClassifierMode::Assisted => Arc::new(AssistedClassifier::new(
            Arc::new(OllamaCompleter::new(
                config.llm.base_url.clone(),
                config.llm.model.clone(),
            )),
            keywords,
            Duration::from_millis(config.llm.timeout_ms),
            IntentCache::new(config.llm.cache_entries),
        )),
    };

    let engine = WorkflowEngine::new(store, classifier);
    if config.checkpoints.enabled {
        engine.with_checkpoints(CheckpointStore::new(config.checkpoints.max_conversations))
    } else {
        engine
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/query", post(run_query))
        .route("/health", get(health_check))
        .route("/stats", get(get_stats))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

async fn run_query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Json<ResponseOutput> {
    let timer = TimedOperation::start();
    let outcome = state.engine.run(request).await;

    state.metrics.record_query(
        outcome.state.analysis_type.as_ref().map(|t| t.as_str()),
        outcome.output.is_completed(),
        timer.elapsed(),
    );

    tracing::info!(
        run_id = %outcome.run_id,
        status = outcome.output.status(),
        elapsed_ms = timer.elapsed().as_millis() as u64,
        "Query answered"
    );

    Json(outcome.output)
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let store_readable = tokio::fs::read_dir(&state.data_dir).await.is_ok();

    Json(HealthResponse {
        status: if store_readable { "ok" } else { "degraded" }.to_string(),
        data_dir: state.data_dir.display().to_string(),
        store_readable,
        classifier: state.engine.classifier_mode().to_string(),
        conversations: state.engine.checkpoints().map(|c| c.len()).unwrap_or(0),
    })
}

async fn get_stats(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> Router {
        let config = AppConfig {
            data_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demo_data"),
            ..AppConfig::offline()
        };
        router(AppState::from_config(&config))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_query(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/query")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_query_completed() {
        let (status, body) = send(app(), post_query(json!({"query": "Tell me about MB TOOL"}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");
        assert_eq!(body["company_name"], "MB TOOL");
    }

    #[tokio::test]
    async fn test_error_payload_is_still_ok() {
        let (status, body) = send(app(), post_query(json!({"query": ""}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "error");
        assert!(!body["suggestions"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_health_and_stats() {
        let app = app();

        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["store_readable"], true);
        assert_eq!(body["classifier"], "keyword");

        send(app.clone(), post_query(json!({"query": "Who are the suppliers of MB TOOL?"}))).await;

        let request = Request::builder().uri("/stats").body(Body::empty()).unwrap();
        let (_, body) = send(app, request).await;
        assert_eq!(body["total_requests"], 1);
        assert_eq!(body["by_analysis_type"]["supplier_analysis"], 1);
    }
}
