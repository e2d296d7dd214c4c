/// HTTP API для анализа продаж

use std::sync::Arc;

use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AnalysisConfig;
use crate::error::MlError;
use crate::pipeline::AnalysisPipeline;
use crate::types::{AnalysisOutput, ClusterResult, ElbowPoint};

/// Последний анализ: конвейер и его кривая локтя для повторной кластеризации
struct Session {
    pipeline: AnalysisPipeline,
    elbow: Vec<ElbowPoint>,
}

#[derive(Clone, Default)]
pub struct AppState {
    session: Arc<tokio::sync::Mutex<Option<Session>>>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub csv: String,
    #[serde(default)]
    pub config: AnalysisConfig,
}

#[derive(Debug, Deserialize)]
pub struct RefitRequest {
    pub k: usize,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

fn unprocessable(e: MlError) -> (StatusCode, String) {
    (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/analyze", post(analyze))
        .route("/api/clusters", post(refit_clusters))
        .layer(cors)
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Sales ML API",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<AnalysisOutput> {
    tracing::info!(
        "Analyze request: {} bytes, k={}",
        request.csv.len(),
        request.config.k
    );

    let pipeline = AnalysisPipeline::from_csv(&request.csv, request.config).map_err(unprocessable)?;
    let output = pipeline.run().map_err(unprocessable)?;

    *state.session.lock().await = Some(Session {
        elbow: output.clustering.elbow_data.clone(),
        pipeline,
    });

    Ok(Json(output))
}

async fn refit_clusters(
    State(state): State<AppState>,
    Json(request): Json<RefitRequest>,
) -> ApiResult<ClusterResult> {
    tracing::info!("Refit request: k={}", request.k);

    let session = state.session.lock().await;
    let session = session.as_ref().ok_or_else(|| {
        (
            StatusCode::CONFLICT,
            "No analysis available, call /api/analyze first".to_string(),
        )
    })?;

    let result = session
        .pipeline
        .refit_clusters(session.elbow.clone(), request.k)
        .map_err(unprocessable)?;

    Ok(Json(result))
}
