use axum::{extract::State, routing::get, Json, Router};

use crate::models::{AppState, HealthResponse, ServiceInfo};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .with_state(state)
}

async fn root(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "Space Mission AI Agent System".to_string(),
        status: "operational".to_string(),
        api_key_configured: state.config.llm.has_credentials(),
        agents: vec![
            "Web Search Agent".to_string(),
            "Visualization Generator Agent".to_string(),
        ],
    })
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        api_configured: state.config.llm.has_credentials(),
    })
}
