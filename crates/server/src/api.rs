//! HTTP boundary in front of the orchestrator.
//!
//! - `GET /recommend?userId=<id>` runs one orchestration and returns the
//!   final ranking as `{"recommendations": [{"MovieID", "Rating"}, ...]}`
//! - `GET /health` answers `{"status": "ok"}`
//!
//! CORS is fully permissive so a browser frontend on any origin can call it.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use data_loader::Recommendation;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::CoordinatorError;
use crate::orchestrator::RecommendationOrchestrator;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RecommendationOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: RecommendationOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

/// Errors surfaced to HTTP callers
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Missing userId query parameter")]
    MissingUserId,

    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::MissingUserId => StatusCode::BAD_REQUEST,
            ApiError::Coordinator(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub recommendations: Vec<Recommendation>,
}

/// Creates the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/recommend", get(recommend))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API on an already bound listener until the process stops
pub async fn serve_http(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("HTTP API listening on http://{}", addr);
    }
    axum::serve(listener, create_router(state)).await
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn recommend(
    State(state): State<AppState>,
    Query(query): Query<RecommendQuery>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let user_id = query
        .user_id
        .filter(|id| !id.trim().is_empty())
        .ok_or(ApiError::MissingUserId)?;

    info!("Recommendation request for user {}", user_id);
    let recommendations = state
        .orchestrator
        .get_recommendations(user_id.trim())
        .await
        .inspect_err(|e| warn!("Recommendation for user {} failed: {}", user_id, e))?;

    Ok(Json(RecommendResponse { recommendations }))
}
